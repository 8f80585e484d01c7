//! Subscription API client

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use nitilens_types::{CurrentSubscription, Plan, PlanTier, Subscription, UsageSnapshot};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::metrics::RequestTimer;
use crate::session::SessionToken;
use crate::Result;

/// Error body returned by the subscription API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpgradeRequest<'a> {
    plan_name: &'a str,
}

/// Client for `/api/subscription/*`
///
/// Every call is a single attempt; failures are returned to the caller
/// without retry.
#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    http: Client,
    config: ClientConfig,
}

impl SubscriptionClient {
    /// Create a client from configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    /// Create a client around an existing HTTP client
    pub fn with_http_client(config: ClientConfig, http: Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &SessionToken,
        body: Option<&serde_json::Value>,
        operation: &'static str,
    ) -> Result<T> {
        let timer = RequestTimer::start(operation);
        let result = self.send(method, path, token, body).await;
        timer.finish(match &result {
            Ok(_) => "success",
            Err(e) => e.metric_label(),
        });
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &SessionToken,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = self.config.url(path);

        let mut request = self.http.request(method, &url).bearer_auth(token.expose());
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, path, "subscription API request failed");
            ClientError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&raw)
                .ok()
                .and_then(|body| body.detail);
            error!(status = %status, path, detail = ?detail, "subscription API error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let raw = response.bytes().await.map_err(|e| {
            error!(error = %e, path, "failed to read subscription API response");
            ClientError::Transport(e.to_string())
        })?;

        serde_json::from_slice::<T>(&raw).map_err(|e| {
            error!(error = %e, path, "failed to parse subscription API response");
            ClientError::Malformed(e.to_string())
        })
    }

    /// Fetch the usage snapshot for the session's tenant
    #[instrument(skip(self, token))]
    pub async fn usage(&self, token: &SessionToken) -> Result<UsageSnapshot> {
        let snapshot: UsageSnapshot = self
            .request(Method::GET, "/api/subscription/usage", token, None, "usage")
            .await?;
        debug!(plan = ?snapshot.plan_name(), "fetched usage snapshot");
        Ok(snapshot)
    }

    /// Fetch the plan catalog
    #[instrument(skip(self, token))]
    pub async fn plans(&self, token: &SessionToken) -> Result<Vec<Plan>> {
        self.request(Method::GET, "/api/subscription/plans", token, None, "plans")
            .await
    }

    /// Fetch the tenant's current subscription
    #[instrument(skip(self, token))]
    pub async fn current(&self, token: &SessionToken) -> Result<CurrentSubscription> {
        self.request(Method::GET, "/api/subscription/current", token, None, "current")
            .await
    }

    /// Move the tenant to another plan, returning the fresh snapshot
    #[instrument(skip(self, token))]
    pub async fn upgrade(&self, token: &SessionToken, plan: PlanTier) -> Result<UsageSnapshot> {
        self.upgrade_to(token, plan.as_str()).await
    }

    /// Like [`Self::upgrade`], sending an unvalidated plan name
    ///
    /// The server decides whether the name is valid.
    #[instrument(skip(self, token))]
    pub async fn upgrade_to(&self, token: &SessionToken, plan_name: &str) -> Result<UsageSnapshot> {
        let body = serde_json::to_value(UpgradeRequest { plan_name })
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        self.request(
            Method::POST,
            "/api/subscription/upgrade",
            token,
            Some(&body),
            "upgrade",
        )
        .await
    }

    /// Cancel auto-renewal, returning the updated subscription
    #[instrument(skip(self, token))]
    pub async fn cancel(&self, token: &SessionToken) -> Result<Subscription> {
        self.request(Method::POST, "/api/subscription/cancel", token, None, "cancel")
            .await
    }
}

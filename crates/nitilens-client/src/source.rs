//! Usage snapshot sources

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use nitilens_entitlement::{build_snapshot, UsageCounters};
use nitilens_types::{PlanTier, Subscription, TenantId, UsageSnapshot};

use crate::config::{ClientConfig, ClientMode};
use crate::session::SessionToken;
use crate::subscription::SubscriptionClient;
use crate::Result;

/// Anything that can produce a usage snapshot for a session
#[async_trait]
pub trait UsageSource: Send + Sync {
    async fn fetch_usage(&self, token: &SessionToken) -> Result<UsageSnapshot>;
}

#[async_trait]
impl UsageSource for SubscriptionClient {
    async fn fetch_usage(&self, token: &SessionToken) -> Result<UsageSnapshot> {
        self.usage(token).await
    }
}

#[async_trait]
impl<S: UsageSource + ?Sized> UsageSource for Arc<S> {
    async fn fetch_usage(&self, token: &SessionToken) -> Result<UsageSnapshot> {
        (**self).fetch_usage(token).await
    }
}

/// Serves one fixed snapshot regardless of the token
#[derive(Debug, Clone)]
pub struct DemoUsageSource {
    snapshot: UsageSnapshot,
}

impl DemoUsageSource {
    pub fn new(snapshot: UsageSnapshot) -> Self {
        Self { snapshot }
    }

    /// An active Pro tenant with light usage
    pub fn pro_tenant() -> Self {
        let plan = PlanTier::Pro.plan();
        let subscription =
            Subscription::start(TenantId::new(), PlanTier::Pro, Utc::now(), Duration::days(365));
        let counters = UsageCounters {
            policies: 3,
            transactions: 125_000,
            users: 4,
        };
        Self::new(build_snapshot(&plan, &subscription, &counters))
    }

    pub fn snapshot(&self) -> &UsageSnapshot {
        &self.snapshot
    }
}

impl Default for DemoUsageSource {
    fn default() -> Self {
        Self::pro_tenant()
    }
}

#[async_trait]
impl UsageSource for DemoUsageSource {
    async fn fetch_usage(&self, _token: &SessionToken) -> Result<UsageSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// Pick the source the configured mode calls for
pub fn usage_source_for(config: &ClientConfig) -> Result<Arc<dyn UsageSource>> {
    match config.mode {
        ClientMode::Live => Ok(Arc::new(SubscriptionClient::new(config.clone())?)),
        ClientMode::Demo => Ok(Arc::new(DemoUsageSource::pro_tenant())),
    }
}

//! Shared usage snapshot cache
//!
//! Gates fetch independently by default. Wrapping the client in
//! [`CachedUsageSource`] lets every gate on a page share one snapshot per
//! session for a short TTL. Plan changes made through the cached source
//! invalidate the session's entry.
//!
//! ```ignore
//! let client = SubscriptionClient::new(ClientConfig::from_env()?)?;
//! let cached = Arc::new(CachedUsageSource::new(client, CacheConfig::default()));
//!
//! // Both gates share one request
//! let a = FeatureGate::new(FeatureKey::Remediation, content_a, cached.clone(), session.clone());
//! let b = FeatureGate::new(FeatureKey::Monitoring, content_b, cached.clone(), session.clone());
//! ```

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::instrument;

use nitilens_types::{PlanTier, Subscription, UsageSnapshot};

use crate::metrics::{record_cache_hit, record_cache_miss};
use crate::session::SessionToken;
use crate::source::UsageSource;
use crate::subscription::SubscriptionClient;
use crate::Result;

/// Cache sizing and freshness
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a snapshot stays fresh.
    /// Default: 30 seconds
    pub ttl: Duration,
    /// Maximum cached sessions.
    /// Default: 1,000
    pub max_sessions: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_sessions: 1_000,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_max_sessions(mut self, max: u64) -> Self {
        self.max_sessions = max;
        self
    }
}

/// Subscription client with a per-session snapshot cache
///
/// Entries are keyed by a hash of the token, never the raw token. Only
/// successful fetches are cached.
#[derive(Clone)]
pub struct CachedUsageSource {
    client: SubscriptionClient,
    snapshots: Cache<String, UsageSnapshot>,
    config: CacheConfig,
}

impl std::fmt::Debug for CachedUsageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedUsageSource")
            .field("config", &self.config)
            .field("entries", &self.snapshots.entry_count())
            .finish_non_exhaustive()
    }
}

impl CachedUsageSource {
    pub fn new(client: SubscriptionClient, config: CacheConfig) -> Self {
        let snapshots = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_live(config.ttl)
            .build();
        Self {
            client,
            snapshots,
            config,
        }
    }

    /// The wrapped client, for calls that bypass the cache
    pub fn client(&self) -> &SubscriptionClient {
        &self.client
    }

    /// Drop the cached snapshot for one session
    pub async fn invalidate_session(&self, token: &SessionToken) {
        self.snapshots.invalidate(&hash_token(token)).await;
    }

    /// Drop every cached snapshot
    pub fn invalidate_all(&self) {
        self.snapshots.invalidate_all();
    }

    /// Upgrade through the client and invalidate the session
    #[instrument(skip(self, token))]
    pub async fn upgrade(&self, token: &SessionToken, plan: PlanTier) -> Result<UsageSnapshot> {
        let snapshot = self.client.upgrade(token, plan).await?;
        self.invalidate_session(token).await;
        Ok(snapshot)
    }

    /// Cancel through the client and invalidate the session
    #[instrument(skip(self, token))]
    pub async fn cancel(&self, token: &SessionToken) -> Result<Subscription> {
        let subscription = self.client.cancel(token).await?;
        self.invalidate_session(token).await;
        Ok(subscription)
    }
}

#[async_trait]
impl UsageSource for CachedUsageSource {
    #[instrument(skip(self, token), level = "debug")]
    async fn fetch_usage(&self, token: &SessionToken) -> Result<UsageSnapshot> {
        let key = hash_token(token);

        if let Some(cached) = self.snapshots.get(&key).await {
            tracing::trace!("usage snapshot cache hit");
            record_cache_hit("usage");
            return Ok(cached);
        }

        record_cache_miss("usage");
        let snapshot = self.client.usage(token).await?;
        self.snapshots.insert(key, snapshot.clone()).await;
        Ok(snapshot)
    }
}

fn hash_token(token: &SessionToken) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    token.expose().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

//! Application state for the subscription API service.

use std::sync::Arc;

use crate::config::Config;
use crate::store::SubscriptionStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Tenants, subscriptions, counters and sessions
    pub store: Arc<SubscriptionStore>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state with an empty store
    pub fn new(config: Config) -> Self {
        let store = SubscriptionStore::new(config.subscription_term);
        Self::with_store(store, config)
    }

    pub fn with_store(store: SubscriptionStore, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("tenants", &self.store.tenant_count())
            .finish_non_exhaustive()
    }
}

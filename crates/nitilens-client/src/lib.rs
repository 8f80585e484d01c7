//! NitiLens Client - REST access to the subscription API
//!
//! Typed wrappers for the subscription endpoints, the session token the
//! browser keeps between page loads, and the [`UsageSource`] seam the
//! feature gate fetches through.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod session;
pub mod source;
pub mod subscription;

pub use cache::{CacheConfig, CachedUsageSource};
pub use config::{ClientConfig, ClientMode, ConfigError};
pub use error::ClientError;
pub use session::{SessionContext, SessionToken};
pub use source::{usage_source_for, DemoUsageSource, UsageSource};
pub use subscription::SubscriptionClient;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

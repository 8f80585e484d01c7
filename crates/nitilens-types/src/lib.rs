//! NitiLens Types - Shared domain types
//!
//! This crate contains the domain types shared by the entitlement resolver,
//! the REST client, the feature gate and the subscription service:
//! - Plans, limits and the fixed plan catalog
//! - Feature and resource keys
//! - Subscriptions and their lifecycle status
//! - Usage snapshots as returned by `GET /api/subscription/usage`

pub mod error;
pub mod feature;
pub mod plan;
pub mod subscription;
pub mod tenant;
pub mod timestamp;
pub mod usage;

pub use error::*;
pub use feature::*;
pub use plan::*;
pub use subscription::*;
pub use tenant::*;
pub use usage::*;

//! NitiLens Entitlement - Plan entitlement resolution
//!
//! Two halves of one contract:
//!
//! - [`resolver`]: what a client concludes from a [`UsageSnapshot`]. Feature
//!   checks and usage verdicts are total over the closed key sets and fail
//!   closed on inactive subscriptions or malformed snapshots.
//! - [`derive`] and [`checks`]: how the backend produces a snapshot from a
//!   plan, a subscription and usage counters, and how it enforces limits and
//!   features on mutating requests.
//!
//! [`UsageSnapshot`]: nitilens_types::UsageSnapshot

pub mod checks;
pub mod derive;
pub mod resolver;

pub use checks::{check_feature, check_feature_name, check_limit, FeatureCheck, LimitCheck};
pub use derive::{build_snapshot, UsageCounters};
pub use resolver::{
    needs_upgrade_nudge, resolve_feature, resolve_feature_name, resolve_usage, usage_percentage,
    Entitlements, UsageSeverity, UsageVerdict, NEAR_LIMIT_PERCENT, OVER_LIMIT_PERCENT,
};

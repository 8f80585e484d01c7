//! Client-side entitlement resolution
//!
//! Answers "is feature F enabled for this tenant right now" and "how close
//! is resource R to its limit" from a usage snapshot. Every function here is
//! pure and total; absence of proof of entitlement resolves to denied.

use nitilens_types::{FeatureKey, Limit, ResourceKey, UsageSnapshot};
use serde::Serialize;

/// Percentage at which a resource counts as near its limit
pub const NEAR_LIMIT_PERCENT: u64 = 80;

/// Percentage at which a resource counts as over its limit
pub const OVER_LIMIT_PERCENT: u64 = 100;

/// Whether `feature` is enabled for the snapshot's tenant.
///
/// False when the snapshot is malformed or the subscription is not active,
/// otherwise the plan's flag for the feature.
pub fn resolve_feature(snapshot: &UsageSnapshot, feature: FeatureKey) -> bool {
    if !snapshot.is_well_formed() {
        return false;
    }
    match &snapshot.subscription {
        Some(sub) if sub.status.is_active() => snapshot.features.get(feature),
        _ => false,
    }
}

/// String-keyed variant of [`resolve_feature`] for untyped boundaries.
///
/// Names outside the known feature set are never unlocked.
pub fn resolve_feature_name(snapshot: &UsageSnapshot, name: &str) -> bool {
    name.parse::<FeatureKey>()
        .is_ok_and(|feature| resolve_feature(snapshot, feature))
}

/// `round(100 * current / limit)`, rounding half up.
///
/// A zero limit is fully consumed.
pub fn usage_percentage(current: u64, limit: u64) -> u64 {
    if limit == 0 {
        return OVER_LIMIT_PERCENT;
    }
    let numerator = 200 * u128::from(current) + u128::from(limit);
    let pct = numerator / (2 * u128::from(limit));
    u64::try_from(pct).unwrap_or(u64::MAX)
}

/// Display severity for a usage bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSeverity {
    /// Below 75%
    Normal,
    /// 75% up to 90%
    Warning,
    /// 90% and above
    Critical,
    /// No cap applies
    Unlimited,
}

impl UsageSeverity {
    /// Severity for a numeric percentage
    pub const fn for_percentage(percentage: u64) -> Self {
        if percentage >= 90 {
            Self::Critical
        } else if percentage >= 75 {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Resolved usage of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageVerdict {
    /// Units consumed
    pub current: u64,
    /// Applicable limit
    pub limit: Limit,
    /// Derived percentage; `None` for unlimited resources
    pub percentage: Option<u64>,
    /// At or above [`NEAR_LIMIT_PERCENT`]
    pub near_limit: bool,
    /// At or above [`OVER_LIMIT_PERCENT`]
    pub over_limit: bool,
}

impl UsageVerdict {
    /// Derive a verdict from raw counts
    pub fn from_counts(current: u64, limit: Limit) -> Self {
        match limit {
            Limit::Unlimited => Self {
                current,
                limit,
                percentage: None,
                near_limit: false,
                over_limit: false,
            },
            Limit::Limited(cap) => {
                let pct = usage_percentage(current, cap);
                Self {
                    current,
                    limit,
                    percentage: Some(pct),
                    near_limit: pct >= NEAR_LIMIT_PERCENT,
                    over_limit: pct >= OVER_LIMIT_PERCENT,
                }
            }
        }
    }

    /// Verdict used when the snapshot cannot be trusted: fully consumed
    fn exhausted(current: u64, limit: Limit) -> Self {
        Self {
            current,
            limit,
            percentage: Some(OVER_LIMIT_PERCENT),
            near_limit: true,
            over_limit: true,
        }
    }

    /// Whether this resource should trigger an upgrade nudge
    pub const fn needs_attention(&self) -> bool {
        self.near_limit || self.over_limit
    }

    pub const fn severity(&self) -> UsageSeverity {
        match self.percentage {
            Some(pct) => UsageSeverity::for_percentage(pct),
            None => UsageSeverity::Unlimited,
        }
    }
}

/// Usage verdict for `resource`.
///
/// The percentage is re-derived from `current` and `limit`; the backend's
/// reported percentage is not consulted. A malformed snapshot resolves
/// every resource as fully consumed.
pub fn resolve_usage(snapshot: &UsageSnapshot, resource: ResourceKey) -> UsageVerdict {
    let record = snapshot
        .limits
        .as_ref()
        .and_then(|limits| limits.get(resource).copied());

    match record {
        Some(usage) if snapshot.is_well_formed() => {
            UsageVerdict::from_counts(usage.current, usage.limit)
        }
        Some(usage) => UsageVerdict::exhausted(usage.current, usage.limit),
        None => UsageVerdict::exhausted(0, Limit::Limited(0)),
    }
}

/// Tenant-level upgrade nudge: any resource near or over its limit
pub fn needs_upgrade_nudge(snapshot: &UsageSnapshot) -> bool {
    ResourceKey::ALL
        .into_iter()
        .any(|resource| resolve_usage(snapshot, resource).needs_attention())
}

/// Every feature and resource resolved from one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entitlements {
    /// Plan name, if the snapshot carried one
    pub plan_name: Option<String>,
    /// Feature verdicts in wire order
    pub features: Vec<(FeatureKey, bool)>,
    /// Usage verdicts in wire order
    pub usage: Vec<(ResourceKey, UsageVerdict)>,
    /// Aggregate upgrade nudge
    pub upgrade_nudge: bool,
}

impl Entitlements {
    /// Resolve everything a snapshot says
    pub fn resolve(snapshot: &UsageSnapshot) -> Self {
        let usage: Vec<_> = ResourceKey::ALL
            .into_iter()
            .map(|resource| (resource, resolve_usage(snapshot, resource)))
            .collect();
        let upgrade_nudge = usage.iter().any(|(_, verdict)| verdict.needs_attention());

        Self {
            plan_name: snapshot.plan_name().map(str::to_string),
            features: FeatureKey::ALL
                .into_iter()
                .map(|feature| (feature, resolve_feature(snapshot, feature)))
                .collect(),
            usage,
            upgrade_nudge,
        }
    }

    /// No tenant at all: nothing enabled, everything exhausted
    pub fn none() -> Self {
        Self::resolve(&UsageSnapshot {
            plan: None,
            subscription: None,
            limits: None,
            features: Default::default(),
        })
    }

    pub fn is_enabled(&self, feature: FeatureKey) -> bool {
        self.features
            .iter()
            .any(|(key, enabled)| *key == feature && *enabled)
    }

    pub fn usage_of(&self, resource: ResourceKey) -> Option<&UsageVerdict> {
        self.usage
            .iter()
            .find(|(key, _)| *key == resource)
            .map(|(_, verdict)| verdict)
    }
}

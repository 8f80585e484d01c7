//! Backend-side limit and feature enforcement

use nitilens_types::{FeatureKey, Limit, ResourceKey, Subscription};
use serde::Serialize;

/// Outcome of a limit check before consuming a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Units consumed before the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    /// Applicable limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
    /// Reason if denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LimitCheck {
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            current: None,
            limit: None,
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of a feature check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureCheck {
    /// Whether the feature is enabled
    pub enabled: bool,
    /// Reason if disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

const NO_ACTIVE_SUBSCRIPTION: &str = "No active subscription";

fn active(subscription: Option<&Subscription>) -> Option<&Subscription> {
    subscription.filter(|sub| sub.status.is_active())
}

/// Check whether `requested` more units of `resource` fit in the plan.
///
/// Denies when `current + requested > limit`. For headcounts (policies,
/// users) with a single request this is `current >= limit`.
pub fn check_limit(
    subscription: Option<&Subscription>,
    resource: ResourceKey,
    current: u64,
    requested: u64,
) -> LimitCheck {
    let Some(sub) = active(subscription) else {
        return LimitCheck::denied(NO_ACTIVE_SUBSCRIPTION);
    };
    let limit = sub.plan.plan().limit_for(resource);

    let exceeded = match limit {
        Limit::Unlimited => false,
        Limit::Limited(cap) => current.saturating_add(requested) > cap,
    };

    let reason = exceeded.then(|| {
        let label = match resource {
            ResourceKey::Policies => "Policy limit exceeded",
            ResourceKey::Transactions => "Monthly transaction limit exceeded",
            ResourceKey::Users => "User limit exceeded",
        };
        format!("{label}. Current: {current}, Limit: {limit}")
    });

    LimitCheck {
        allowed: !exceeded,
        current: Some(current),
        limit: Some(limit),
        reason,
    }
}

/// Check whether `feature` is enabled for the subscription's plan
pub fn check_feature(subscription: Option<&Subscription>, feature: FeatureKey) -> FeatureCheck {
    let Some(sub) = active(subscription) else {
        return FeatureCheck {
            enabled: false,
            reason: Some(NO_ACTIVE_SUBSCRIPTION.to_string()),
        };
    };

    if sub.plan.plan().features.get(feature) {
        FeatureCheck {
            enabled: true,
            reason: None,
        }
    } else {
        FeatureCheck {
            enabled: false,
            reason: Some(format!(
                "Feature '{feature}' not available in {} plan. Upgrade required.",
                sub.plan
            )),
        }
    }
}

/// String-keyed variant of [`check_feature`]
pub fn check_feature_name(subscription: Option<&Subscription>, name: &str) -> FeatureCheck {
    match name.parse::<FeatureKey>() {
        Ok(feature) => check_feature(subscription, feature),
        Err(_) => FeatureCheck {
            enabled: false,
            reason: Some("Unknown feature".to_string()),
        },
    }
}

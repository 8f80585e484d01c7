//! Usage snapshot types
//!
//! These mirror the body of `GET /api/subscription/usage`. The top-level
//! sections are optional at the wire boundary so that an incomplete body
//! still parses and can be resolved fail-closed by the entitlement resolver
//! instead of being trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FeatureFlags, Limit, Plan, ResourceKey, Subscription, SubscriptionStatus};

/// Denormalized plan fields carried in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Plan name
    pub name: String,
    /// Monthly price in dollars
    pub price_monthly: f64,
}

impl From<&Plan> for PlanSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            name: plan.name.to_string(),
            price_monthly: plan.price_monthly,
        }
    }
}

/// Denormalized subscription fields carried in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub status: SubscriptionStatus,
    #[serde(with = "crate::timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "crate::timestamp")]
    pub expires_at: DateTime<Utc>,
    pub auto_renew: bool,
}

impl From<&Subscription> for SubscriptionSummary {
    fn from(sub: &Subscription) -> Self {
        Self {
            status: sub.status,
            started_at: sub.started_at,
            expires_at: sub.expires_at,
            auto_renew: sub.auto_renew,
        }
    }
}

/// Consumption of one resource against its limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Units consumed
    pub current: u64,
    /// Applicable limit
    pub limit: Limit,
    /// Percentage as reported by the backend; absent for unlimited resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Per-resource usage records
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<ResourceUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<ResourceUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<ResourceUsage>,
}

impl UsageLimits {
    /// Usage record for a resource, if present
    pub const fn get(&self, resource: ResourceKey) -> Option<&ResourceUsage> {
        match resource {
            ResourceKey::Policies => self.policies.as_ref(),
            ResourceKey::Transactions => self.transactions.as_ref(),
            ResourceKey::Users => self.users.as_ref(),
        }
    }

    /// Set the usage record for a resource
    #[must_use]
    pub fn with(mut self, resource: ResourceKey, usage: ResourceUsage) -> Self {
        match resource {
            ResourceKey::Policies => self.policies = Some(usage),
            ResourceKey::Transactions => self.transactions = Some(usage),
            ResourceKey::Users => self.users = Some(usage),
        }
        self
    }

    /// Whether every resource has a record
    pub fn is_complete(&self) -> bool {
        ResourceKey::ALL.iter().all(|key| self.get(*key).is_some())
    }
}

/// Point-in-time read of a tenant's plan, subscription, usage and features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    #[serde(default)]
    pub plan: Option<PlanSummary>,
    #[serde(default)]
    pub subscription: Option<SubscriptionSummary>,
    #[serde(default)]
    pub limits: Option<UsageLimits>,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl UsageSnapshot {
    /// Whether the snapshot carries every section the resolver relies on
    pub fn is_well_formed(&self) -> bool {
        self.plan.is_some()
            && self.subscription.is_some()
            && self.limits.as_ref().is_some_and(UsageLimits::is_complete)
    }

    /// Plan name, if present
    pub fn plan_name(&self) -> Option<&str> {
        self.plan.as_ref().map(|plan| plan.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_BODY: &str = r#"{
        "plan": {"name": "pro", "price_monthly": 299.0},
        "subscription": {
            "status": "active",
            "started_at": "2025-01-01T00:00:00",
            "expires_at": "2026-01-01T00:00:00",
            "auto_renew": true
        },
        "limits": {
            "policies": {"current": 3, "limit": 10, "percentage": 30.0},
            "transactions": {"current": 5000, "limit": 1000000, "percentage": 0.5},
            "users": {"current": 2, "limit": "unlimited", "percentage": 0}
        },
        "features": {
            "anomaly_detection": true,
            "remediation": true,
            "regulatory_mapping": true,
            "monitoring": true,
            "policy_impact": true,
            "multi_language": false
        }
    }"#;

    #[test]
    fn test_parse_backend_body() {
        let snapshot: UsageSnapshot = serde_json::from_str(FULL_BODY).unwrap();

        assert!(snapshot.is_well_formed());
        assert_eq!(snapshot.plan_name(), Some("pro"));
        let limits = snapshot.limits.unwrap();
        assert_eq!(limits.get(ResourceKey::Policies).unwrap().limit, Limit::Limited(10));
        assert_eq!(limits.get(ResourceKey::Users).unwrap().limit, Limit::Unlimited);
        assert!(!snapshot.features.multi_language);
    }

    #[test]
    fn test_missing_sections_parse_as_malformed() {
        let snapshot: UsageSnapshot =
            serde_json::from_str(r#"{"features": {"remediation": true}}"#).unwrap();
        assert!(!snapshot.is_well_formed());
        assert!(snapshot.plan.is_none());
    }

    #[test]
    fn test_partial_limits_are_not_well_formed() {
        let mut snapshot: UsageSnapshot = serde_json::from_str(FULL_BODY).unwrap();
        snapshot.limits = Some(UsageLimits {
            users: None,
            ..snapshot.limits.unwrap()
        });
        assert!(!snapshot.is_well_formed());
    }
}

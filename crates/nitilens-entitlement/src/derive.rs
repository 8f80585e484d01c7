//! Backend-side snapshot derivation

use nitilens_types::{
    Plan, PlanSummary, ResourceKey, ResourceUsage, Subscription, SubscriptionSummary, UsageLimits,
    UsageSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::resolver::usage_percentage;

/// Current consumption counters for one tenant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    /// Active policies
    pub policies: u64,
    /// Transactions scanned this calendar month
    pub transactions: u64,
    /// Active users
    pub users: u64,
}

impl UsageCounters {
    pub const fn get(&self, resource: ResourceKey) -> u64 {
        match resource {
            ResourceKey::Policies => self.policies,
            ResourceKey::Transactions => self.transactions,
            ResourceKey::Users => self.users,
        }
    }

    /// Add `count` units to a resource, saturating
    pub fn add(&mut self, resource: ResourceKey, count: u64) {
        let slot = match resource {
            ResourceKey::Policies => &mut self.policies,
            ResourceKey::Transactions => &mut self.transactions,
            ResourceKey::Users => &mut self.users,
        };
        *slot = slot.saturating_add(count);
    }
}

/// Build the usage snapshot served by `GET /api/subscription/usage`.
///
/// Percentages are rounded; unlimited resources carry no percentage.
pub fn build_snapshot(
    plan: &Plan,
    subscription: &Subscription,
    counters: &UsageCounters,
) -> UsageSnapshot {
    let limits = ResourceKey::ALL
        .into_iter()
        .fold(UsageLimits::default(), |limits, resource| {
            let current = counters.get(resource);
            let limit = plan.limit_for(resource);
            let percentage = limit
                .value()
                .map(|cap| usage_percentage(current, cap) as f64);
            limits.with(
                resource,
                ResourceUsage {
                    current,
                    limit,
                    percentage,
                },
            )
        });

    UsageSnapshot {
        plan: Some(PlanSummary::from(plan)),
        subscription: Some(SubscriptionSummary::from(subscription)),
        limits: Some(limits),
        features: plan.features,
    }
}

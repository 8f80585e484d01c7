//! Usage panel view model

use nitilens_entitlement::{Entitlements, UsageSeverity, UsageVerdict};
use nitilens_types::{Limit, ResourceKey, UsageSnapshot};

/// One resource's usage line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRow {
    pub resource: ResourceKey,
    pub current: u64,
    pub limit: Limit,
    /// `None` for unlimited resources
    pub percentage: Option<u64>,
    pub severity: UsageSeverity,
}

impl UsageRow {
    fn new(resource: ResourceKey, verdict: &UsageVerdict) -> Self {
        Self {
            resource,
            current: verdict.current,
            limit: verdict.limit,
            percentage: verdict.percentage,
            severity: verdict.severity(),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self.resource {
            ResourceKey::Policies => "Policies",
            ResourceKey::Transactions => "Transactions Scanned",
            ResourceKey::Users => "Active Users",
        }
    }

    /// `current / limit`
    pub fn summary(&self) -> String {
        format!("{} / {}", self.current, self.limit)
    }

    /// Only numeric limits get a progress bar
    pub const fn shows_progress(&self) -> bool {
        !self.limit.is_unlimited()
    }
}

/// Usage rows for every resource plus the upgrade nudge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsagePanel {
    pub rows: Vec<UsageRow>,
    pub nudge: bool,
}

impl UsagePanel {
    pub const NUDGE_MESSAGE: &'static str =
        "You're approaching your plan limits. Consider upgrading to avoid service interruption.";

    pub fn from_snapshot(snapshot: &UsageSnapshot) -> Self {
        Self::from_entitlements(&Entitlements::resolve(snapshot))
    }

    pub fn from_entitlements(entitlements: &Entitlements) -> Self {
        Self {
            rows: entitlements
                .usage
                .iter()
                .map(|(resource, verdict)| UsageRow::new(*resource, verdict))
                .collect(),
            nudge: entitlements.upgrade_nudge,
        }
    }

    pub fn row(&self, resource: ResourceKey) -> Option<&UsageRow> {
        self.rows.iter().find(|row| row.resource == resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nitilens_entitlement::{build_snapshot, UsageCounters};
    use nitilens_types::{PlanTier, Subscription, TenantId};

    fn snapshot_for(tier: PlanTier, counters: UsageCounters) -> UsageSnapshot {
        let sub = Subscription::start(TenantId::new(), tier, Utc::now(), chrono::Duration::days(365));
        build_snapshot(&tier.plan(), &sub, &counters)
    }

    #[test]
    fn test_rows_and_nudge() {
        let panel = UsagePanel::from_snapshot(&snapshot_for(
            PlanTier::Pro,
            UsageCounters {
                policies: 9,
                transactions: 760_000,
                users: 2,
            },
        ));

        assert!(panel.nudge);
        let policies = panel.row(ResourceKey::Policies).unwrap();
        assert_eq!(policies.percentage, Some(90));
        assert_eq!(policies.severity, UsageSeverity::Critical);
        assert_eq!(policies.summary(), "9 / 10");

        let transactions = panel.row(ResourceKey::Transactions).unwrap();
        assert_eq!(transactions.severity, UsageSeverity::Warning);
        assert_eq!(transactions.label(), "Transactions Scanned");

        assert_eq!(
            panel.row(ResourceKey::Users).unwrap().severity,
            UsageSeverity::Normal
        );
    }

    #[test]
    fn test_unlimited_rows_have_no_progress() {
        let panel = UsagePanel::from_snapshot(&snapshot_for(
            PlanTier::Enterprise,
            UsageCounters {
                policies: 500,
                transactions: 9_000_000,
                users: 300,
            },
        ));

        assert!(!panel.nudge);
        for row in &panel.rows {
            assert!(!row.shows_progress());
            assert_eq!(row.percentage, None);
            assert_eq!(row.severity, UsageSeverity::Unlimited);
        }
        assert_eq!(panel.row(ResourceKey::Users).unwrap().summary(), "300 / unlimited");
    }
}

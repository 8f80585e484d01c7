//! Gate render output

use nitilens_types::FeatureKey;

use crate::state::LockReason;

/// Route of the subscription page
pub const UPGRADE_ROUTE: &str = "/subscription";

/// What a gate renders
#[derive(Debug, Clone, PartialEq)]
pub enum GateView<V> {
    /// Neutral placeholder while entitlement is unresolved
    Skeleton,
    /// The content's own output, unmodified
    Content(V),
    Locked(LockedView<V>),
}

impl<V> GateView<V> {
    pub fn is_skeleton(&self) -> bool {
        matches!(self, Self::Skeleton)
    }

    /// The content view, if unlocked
    pub fn content(&self) -> Option<&V> {
        match self {
            Self::Content(view) => Some(view),
            _ => None,
        }
    }

    pub fn locked(&self) -> Option<&LockedView<V>> {
        match self {
            Self::Locked(locked) => Some(locked),
            _ => None,
        }
    }
}

/// Locked banner, upgrade action and inert preview
#[derive(Debug, Clone, PartialEq)]
pub struct LockedView<V> {
    pub reason: LockReason,
    pub banner: LockedBanner,
    pub upgrade: UpgradeAction,
    pub preview: Preview<V>,
}

/// Banner naming the locked feature and the tenant's plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedBanner {
    pub feature: FeatureKey,
    /// Current plan name, when a snapshot supplied one
    pub plan: Option<String>,
}

impl LockedBanner {
    pub const SUBTITLE: &'static str = "This feature is not available in your current plan";

    pub fn title(&self) -> &'static str {
        self.feature.display_name()
    }

    pub fn message(&self) -> String {
        match &self.plan {
            Some(plan) => format!(
                "{} is not available in the {plan} plan.",
                self.feature.display_name()
            ),
            None => format!(
                "{} requires an active subscription.",
                self.feature.display_name()
            ),
        }
    }
}

/// Call-to-action leading to the subscription page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeAction {
    pub label: &'static str,
    pub route: &'static str,
}

impl Default for UpgradeAction {
    fn default() -> Self {
        Self {
            label: "Upgrade Plan",
            route: UPGRADE_ROUTE,
        }
    }
}

/// De-emphasized rendering of the real content under a lock overlay
///
/// Never interactive; the gate swallows input while locked.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview<V> {
    pub view: V,
}

impl<V> Preview<V> {
    pub const OVERLAY_TITLE: &'static str = "Feature Locked";
    pub const OVERLAY_HINT: &'static str = "Upgrade to access";

    pub const fn is_interactive(&self) -> bool {
        false
    }
}

//! NitiLens Gate - feature gating for protected views
//!
//! A [`FeatureGate`] wraps content that should only run for entitled
//! tenants. It resolves entitlement once per mount and either mounts the
//! content, or shows a locked banner over an inert preview of it.
//!
//! The crate also carries the view models for the subscription page: the
//! usage panel and the plan upgrade/cancel controller.

pub mod content;
pub mod gate;
pub mod page;
pub mod state;
pub mod usage_panel;
pub mod view;

pub use content::{GatedContent, InputOutcome};
pub use gate::FeatureGate;
pub use page::{Notice, PageState, PlanCard, SubscriptionPage};
pub use state::{GateState, LockReason};
pub use usage_panel::{UsagePanel, UsageRow};
pub use view::{GateView, LockedBanner, LockedView, Preview, UpgradeAction, UPGRADE_ROUTE};

//! Subscription page controller
//!
//! Loads the usage snapshot and plan catalog, and runs plan upgrades and
//! cancellations. Mutations never touch the displayed snapshot directly: a
//! success reloads it from the server, a failure leaves it as it was and
//! records an error notice.

use tracing::{info, warn};

use nitilens_client::{CachedUsageSource, ClientError, SessionContext, SubscriptionClient};
use nitilens_types::{Plan, PlanTier, UsageSnapshot};

use crate::usage_panel::UsagePanel;

const LOAD_FALLBACK: &str = "Failed to load subscription data";
const UPGRADE_FALLBACK: &str = "Failed to upgrade plan";
const CANCEL_FALLBACK: &str = "Failed to cancel subscription";

/// Load state of the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Loading,
    Ready,
    /// Nothing could be loaded; carries the message to show
    Failed(String),
}

/// User-facing outcome of the last action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// One entry in the plan picker
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCard {
    pub plan: Plan,
    pub is_current: bool,
}

impl PlanCard {
    /// Every plan but the current one offers an upgrade button
    pub fn can_upgrade(&self) -> bool {
        !self.is_current
    }
}

/// Controller behind the `/subscription` page
#[derive(Debug)]
pub struct SubscriptionPage {
    client: SubscriptionClient,
    cache: Option<CachedUsageSource>,
    session: SessionContext,
    state: PageState,
    usage: Option<UsageSnapshot>,
    plans: Vec<Plan>,
    notice: Option<Notice>,
}

impl SubscriptionPage {
    pub const CANCEL_PROMPT: &'static str =
        "Cancel subscription? It will remain active until the end of the billing period.";

    pub fn new(client: SubscriptionClient, session: SessionContext) -> Self {
        Self {
            client,
            cache: None,
            session,
            state: PageState::Loading,
            usage: None,
            plans: Vec::new(),
            notice: None,
        }
    }

    /// Run mutations through a shared cache so its gates see plan changes
    pub fn with_cache(cache: CachedUsageSource, session: SessionContext) -> Self {
        let mut page = Self::new(cache.client().clone(), session);
        page.cache = Some(cache);
        page
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn usage(&self) -> Option<&UsageSnapshot> {
        self.usage.as_ref()
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Take the notice once it has been shown
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn usage_panel(&self) -> Option<UsagePanel> {
        self.usage.as_ref().map(UsagePanel::from_snapshot)
    }

    pub fn plan_cards(&self) -> Vec<PlanCard> {
        let current = self.usage.as_ref().and_then(UsageSnapshot::plan_name);
        self.plans
            .iter()
            .map(|plan| PlanCard {
                plan: plan.clone(),
                is_current: current == Some(plan.name.as_str()),
            })
            .collect()
    }

    /// Cancellation is offered while auto-renew is on
    pub fn can_cancel(&self) -> bool {
        self.usage
            .as_ref()
            .and_then(|usage| usage.subscription.as_ref())
            .is_some_and(|sub| sub.auto_renew)
    }

    pub fn upgrade_prompt(plan: PlanTier) -> String {
        format!("Upgrade to {plan} plan?")
    }

    /// Fetch the usage snapshot and plan catalog together
    pub async fn load(&mut self) {
        let Some(token) = self.session.token().cloned() else {
            self.fail_load(ClientError::NoSession);
            return;
        };

        if self.usage.is_none() {
            self.state = PageState::Loading;
        }

        let (usage, plans) = tokio::join!(self.client.usage(&token), self.client.plans(&token));
        match usage.and_then(|usage| plans.map(|plans| (usage, plans))) {
            Ok((usage, plans)) => {
                self.usage = Some(usage);
                self.plans = plans;
                self.state = PageState::Ready;
            }
            Err(e) => self.fail_load(e),
        }
    }

    fn fail_load(&mut self, error: ClientError) {
        warn!(error = %error, "failed to load subscription data");
        let message = error.detail(LOAD_FALLBACK);
        if self.usage.is_some() {
            self.notice = Some(Notice::Error(message));
            self.state = PageState::Ready;
        } else {
            self.state = PageState::Failed(message);
        }
    }

    /// Move to another plan. Returns true on success.
    pub async fn upgrade(&mut self, plan: PlanTier) -> bool {
        self.notice = None;
        let Some(token) = self.session.token().cloned() else {
            self.notice = Some(Notice::Error(UPGRADE_FALLBACK.to_string()));
            return false;
        };

        let result = match &self.cache {
            Some(cache) => cache.upgrade(&token, plan).await,
            None => self.client.upgrade(&token, plan).await,
        };

        match result {
            Ok(_) => {
                info!(%plan, "plan upgraded");
                self.after_mutation("Plan upgraded successfully!").await;
                true
            }
            Err(e) => {
                warn!(%plan, error = %e, "plan upgrade failed");
                self.notice = Some(Notice::Error(e.detail(UPGRADE_FALLBACK)));
                false
            }
        }
    }

    /// Turn off auto-renewal. Returns true on success.
    pub async fn cancel(&mut self) -> bool {
        self.notice = None;
        let Some(token) = self.session.token().cloned() else {
            self.notice = Some(Notice::Error(CANCEL_FALLBACK.to_string()));
            return false;
        };

        let result = match &self.cache {
            Some(cache) => cache.cancel(&token).await,
            None => self.client.cancel(&token).await,
        };

        match result {
            Ok(_) => {
                info!("subscription cancelled");
                self.after_mutation("Subscription cancelled. Auto-renewal disabled.")
                    .await;
                true
            }
            Err(e) => {
                warn!(error = %e, "subscription cancel failed");
                self.notice = Some(Notice::Error(e.detail(CANCEL_FALLBACK)));
                false
            }
        }
    }

    async fn after_mutation(&mut self, message: &str) {
        self.load().await;
        if !matches!(self.notice, Some(Notice::Error(_))) {
            self.notice = Some(Notice::Success(message.to_string()));
        }
    }
}

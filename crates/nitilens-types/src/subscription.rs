//! Subscription types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Plan, PlanTier, TenantId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// Subscription was cancelled
    Cancelled,
    /// Billing period ended without renewal
    Expired,
    /// Any status this client does not recognise; never active
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub subscription_id: SubscriptionId,
    /// Tenant that owns the subscription
    pub tenant_id: TenantId,
    /// Current plan
    pub plan: PlanTier,
    /// Subscription status
    pub status: SubscriptionStatus,
    /// Start of the current term
    #[serde(with = "crate::timestamp")]
    pub started_at: DateTime<Utc>,
    /// End of the current term
    #[serde(with = "crate::timestamp")]
    pub expires_at: DateTime<Utc>,
    /// Whether the term renews when it ends
    pub auto_renew: bool,
}

impl Subscription {
    /// Start a new active, auto-renewing subscription
    pub fn start(tenant_id: TenantId, plan: PlanTier, now: DateTime<Utc>, term: Duration) -> Self {
        Self {
            subscription_id: SubscriptionId::new(),
            tenant_id,
            plan,
            status: SubscriptionStatus::Active,
            started_at: now,
            expires_at: now + term,
            auto_renew: true,
        }
    }

    /// Length of the current term
    pub fn term(&self) -> Duration {
        self.expires_at - self.started_at
    }

    /// Whether the current term has ended
    pub fn is_past_term(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Bring the status up to date with the clock.
    ///
    /// An active subscription past its term either rolls into a new term of
    /// the same length (`auto_renew`) or expires. Returns true if anything
    /// changed.
    pub fn settle(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.is_active() || !self.is_past_term(now) {
            return false;
        }
        if self.auto_renew {
            let term = self.term();
            if term <= Duration::zero() {
                self.status = SubscriptionStatus::Expired;
                return true;
            }
            while self.is_past_term(now) {
                self.started_at = self.expires_at;
                self.expires_at = self.started_at + term;
            }
        } else {
            self.status = SubscriptionStatus::Expired;
        }
        true
    }
}

/// Body of `GET /api/subscription/current`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSubscription {
    pub subscription_id: SubscriptionId,
    /// Full definition of the subscribed plan
    pub plan: Plan,
    pub status: SubscriptionStatus,
    #[serde(with = "crate::timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "crate::timestamp")]
    pub expires_at: DateTime<Utc>,
    pub auto_renew: bool,
}

impl From<&Subscription> for CurrentSubscription {
    fn from(sub: &Subscription) -> Self {
        Self {
            subscription_id: sub.subscription_id,
            plan: sub.plan.plan(),
            status: sub.status,
            started_at: sub.started_at,
            expires_at: sub.expires_at,
            auto_renew: sub.auto_renew,
        }
    }
}

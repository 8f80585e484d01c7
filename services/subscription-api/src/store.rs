//! In-memory subscription store
//!
//! Holds tenants, their subscriptions, usage counters and the session
//! tokens that identify them. Every read settles the subscription against
//! the clock first, so an elapsed term is renewed or expired before it is
//! returned. Time is passed in explicitly.

use chrono::{DateTime, Datelike, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use nitilens_entitlement::{
    build_snapshot, check_feature_name, check_limit, FeatureCheck, LimitCheck, UsageCounters,
};
use nitilens_types::{Limit, PlanTier, ResourceKey, Subscription, TenantId, UsageSnapshot};

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("No active subscription")]
    NoActiveSubscription,

    #[error("Unknown tenant: {0}")]
    UnknownTenant(TenantId),
}

/// An organization account
#[derive(Debug, Clone, Serialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Calendar month in UTC, as `(year, month)`
type Month = (i32, u32);

fn month_of(at: DateTime<Utc>) -> Month {
    (at.year(), at.month())
}

/// Per-tenant counters
#[derive(Debug, Clone, Copy)]
struct TenantUsage {
    counters: UsageCounters,
    /// Month the transaction counter belongs to
    month: Month,
}

impl TenantUsage {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            counters: UsageCounters::default(),
            month: month_of(now),
        }
    }

    /// Start a fresh transaction count when the month has turned
    fn roll_month(&mut self, now: DateTime<Utc>) {
        let month = month_of(now);
        if month != self.month {
            self.month = month;
            self.counters.transactions = 0;
        }
    }
}

/// Result of recording usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Counter incremented
    Recorded {
        /// Counters after the increment
        counters: UsageCounters,
        limit: Limit,
    },
    /// Limit check failed; nothing was recorded
    Denied(LimitCheck),
}

/// Tenants, subscriptions, counters and sessions
#[derive(Debug)]
pub struct SubscriptionStore {
    tenants: DashMap<TenantId, Tenant>,
    subscriptions: DashMap<TenantId, Subscription>,
    usage: DashMap<TenantId, TenantUsage>,
    sessions: DashMap<String, TenantId>,
    term: Duration,
}

impl SubscriptionStore {
    /// Create an empty store whose subscriptions run for `term`
    pub fn new(term: Duration) -> Self {
        Self {
            tenants: DashMap::new(),
            subscriptions: DashMap::new(),
            usage: DashMap::new(),
            sessions: DashMap::new(),
            term,
        }
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    pub fn tenant(&self, tenant_id: TenantId) -> Option<Tenant> {
        self.tenants.get(&tenant_id).map(|t| t.clone())
    }

    /// Register a tenant with a fresh, auto-renewing subscription
    pub fn create_tenant(
        &self,
        name: impl Into<String>,
        plan: PlanTier,
        now: DateTime<Utc>,
    ) -> TenantId {
        let id = TenantId::new();
        let tenant = Tenant {
            id,
            name: name.into(),
            created_at: now,
        };
        tracing::info!(tenant_id = %id, name = %tenant.name, %plan, "Tenant created");

        self.tenants.insert(id, tenant);
        self.subscriptions
            .insert(id, Subscription::start(id, plan, now, self.term));
        self.usage.insert(id, TenantUsage::new(now));
        id
    }

    /// Bind a session token to a tenant
    pub fn insert_session(&self, token: impl Into<String>, tenant_id: TenantId) {
        self.sessions.insert(token.into(), tenant_id);
    }

    pub fn revoke_session(&self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn tenant_for_session(&self, token: &str) -> Option<TenantId> {
        self.sessions.get(token).map(|entry| *entry)
    }

    /// Set the headcount of a non-metered resource
    pub fn set_count(
        &self,
        tenant_id: TenantId,
        resource: ResourceKey,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut usage = self
            .usage
            .get_mut(&tenant_id)
            .ok_or(StoreError::UnknownTenant(tenant_id))?;
        usage.roll_month(now);
        let counters = &mut usage.counters;
        let slot = match resource {
            ResourceKey::Policies => &mut counters.policies,
            ResourceKey::Transactions => &mut counters.transactions,
            ResourceKey::Users => &mut counters.users,
        };
        *slot = count;
        Ok(())
    }

    /// The tenant's subscription in any status, settled against `now`
    pub fn subscription(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Option<Subscription> {
        let mut sub = self.subscriptions.get_mut(&tenant_id)?;
        if sub.settle(now) {
            tracing::info!(
                tenant_id = %tenant_id,
                status = %sub.status,
                expires_at = %sub.expires_at,
                "Subscription term settled"
            );
        }
        Some(sub.clone())
    }

    /// The tenant's subscription, only if active
    pub fn active_subscription(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Option<Subscription> {
        self.subscription(tenant_id, now)
            .filter(|sub| sub.status.is_active())
    }

    /// Current counters, with the transaction count for `now`'s month
    pub fn counters(&self, tenant_id: TenantId, now: DateTime<Utc>) -> UsageCounters {
        match self.usage.get_mut(&tenant_id) {
            Some(mut usage) => {
                usage.roll_month(now);
                usage.counters
            }
            None => UsageCounters::default(),
        }
    }

    /// Usage snapshot for a tenant with an active subscription
    pub fn usage_snapshot(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Option<UsageSnapshot> {
        let sub = self.active_subscription(tenant_id, now)?;
        let counters = self.counters(tenant_id, now);
        Some(build_snapshot(&sub.plan.plan(), &sub, &counters))
    }

    /// Move an active subscription to another plan. Counters carry over.
    pub fn upgrade(
        &self,
        tenant_id: TenantId,
        plan: PlanTier,
        now: DateTime<Utc>,
    ) -> Result<Subscription, StoreError> {
        self.active_subscription(tenant_id, now)
            .ok_or(StoreError::NoActiveSubscription)?;

        let mut sub = self
            .subscriptions
            .get_mut(&tenant_id)
            .ok_or(StoreError::UnknownTenant(tenant_id))?;
        let old_plan = sub.plan;
        sub.plan = plan;
        tracing::info!(tenant_id = %tenant_id, from = %old_plan, to = %plan, "Subscription plan changed");
        Ok(sub.clone())
    }

    /// Turn off auto-renewal; the subscription stays active until it expires
    pub fn cancel(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Result<Subscription, StoreError> {
        self.active_subscription(tenant_id, now)
            .ok_or(StoreError::NoActiveSubscription)?;

        let mut sub = self
            .subscriptions
            .get_mut(&tenant_id)
            .ok_or(StoreError::UnknownTenant(tenant_id))?;
        sub.auto_renew = false;
        tracing::info!(tenant_id = %tenant_id, expires_at = %sub.expires_at, "Auto-renewal disabled");
        Ok(sub.clone())
    }

    /// Check the limit and, if allowed, add `count` units.
    ///
    /// The check and the increment happen under the tenant's counter lock,
    /// so concurrent callers cannot both pass the last free slot.
    pub fn record_usage(
        &self,
        tenant_id: TenantId,
        resource: ResourceKey,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, StoreError> {
        let sub = self.subscription(tenant_id, now);

        let mut usage = self
            .usage
            .get_mut(&tenant_id)
            .ok_or(StoreError::UnknownTenant(tenant_id))?;
        usage.roll_month(now);

        let current = usage.counters.get(resource);
        let check = check_limit(sub.as_ref(), resource, current, count);
        match check.limit {
            Some(limit) if check.allowed => {
                usage.counters.add(resource, count);
                Ok(RecordOutcome::Recorded {
                    counters: usage.counters,
                    limit,
                })
            }
            _ => Ok(RecordOutcome::Denied(check)),
        }
    }

    /// Check a feature by wire name
    pub fn check_feature(&self, tenant_id: TenantId, feature: &str, now: DateTime<Utc>) -> FeatureCheck {
        let sub = self.subscription(tenant_id, now);
        check_feature_name(sub.as_ref(), feature)
    }
}

//! Subscription handlers

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::time::Instant;
use tracing::instrument;

use nitilens_types::{
    plan_catalog, CurrentSubscription, Plan, PlanTier, Subscription, TenantId, UsageSnapshot,
};

use crate::error::{ApiError, ApiResult};
use crate::extractors::SessionTenant;
use crate::handlers::shared::timed;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub plan_name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/subscription/current
#[instrument(skip(state))]
pub async fn get_current(
    State(state): State<AppState>,
    SessionTenant(tenant_id): SessionTenant,
) -> ApiResult<Json<CurrentSubscription>> {
    let start = Instant::now();

    let result = state
        .store
        .active_subscription(tenant_id, Utc::now())
        .map(|sub| Json(CurrentSubscription::from(&sub)))
        .ok_or_else(|| ApiError::NotFound("No active subscription found".into()));

    timed("get_current", start, result)
}

/// GET /api/subscription/usage
#[instrument(skip(state))]
pub async fn get_usage(
    State(state): State<AppState>,
    SessionTenant(tenant_id): SessionTenant,
) -> ApiResult<Json<UsageSnapshot>> {
    let start = Instant::now();

    let result = state
        .store
        .usage_snapshot(tenant_id, Utc::now())
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No active subscription".into()));

    timed("get_usage", start, result)
}

/// GET /api/subscription/plans
pub async fn list_plans() -> Json<Vec<Plan>> {
    Json(plan_catalog())
}

/// POST /api/subscription/upgrade
#[instrument(skip(state, req))]
pub async fn upgrade(
    State(state): State<AppState>,
    SessionTenant(tenant_id): SessionTenant,
    Json(req): Json<UpgradeRequest>,
) -> ApiResult<Json<UsageSnapshot>> {
    let start = Instant::now();

    let result = apply_upgrade(&state, tenant_id, &req.plan_name);
    timed("upgrade", start, result)
}

fn apply_upgrade(state: &AppState, tenant_id: TenantId, plan_name: &str) -> ApiResult<Json<UsageSnapshot>> {
    let plan: PlanTier = plan_name
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid plan name".into()))?;

    let now = Utc::now();
    state.store.upgrade(tenant_id, plan, now)?;
    metrics::counter!("subscription_upgrades_total", "plan" => plan.as_str()).increment(1);

    state
        .store
        .usage_snapshot(tenant_id, now)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("snapshot missing after upgrade".into()))
}

/// POST /api/subscription/cancel
#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    SessionTenant(tenant_id): SessionTenant,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();

    let result = state
        .store
        .cancel(tenant_id, Utc::now())
        .map(|sub| {
            metrics::counter!("subscription_cancellations_total").increment(1);
            Json(sub)
        })
        .map_err(ApiError::from);

    timed("cancel", start, result)
}

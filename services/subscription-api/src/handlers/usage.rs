//! Usage recording handlers

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use nitilens_types::{Limit, ResourceKey, TenantId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::SessionTenant;
use crate::handlers::shared::timed;
use crate::state::AppState;
use crate::store::RecordOutcome;

/// Upper bound on a single usage record
const MAX_RECORD_COUNT: u64 = 1_000_000;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    #[serde(default = "default_count")]
    pub count: u64,
}

fn default_count() -> u64 {
    1
}

#[derive(Debug, Serialize)]
pub struct RecordUsageResponse {
    pub resource: ResourceKey,
    /// Counter value after recording
    pub current: u64,
    pub limit: Limit,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/subscription/usage/{resource}
///
/// Checks the plan limit, then adds `count` units. A denied request records
/// nothing and answers 403 with the denial reason.
#[instrument(skip(state, req))]
pub async fn record_usage(
    State(state): State<AppState>,
    SessionTenant(tenant_id): SessionTenant,
    Path(resource): Path<String>,
    Json(req): Json<RecordUsageRequest>,
) -> ApiResult<Json<RecordUsageResponse>> {
    let start = Instant::now();

    let result = apply_record(&state, tenant_id, &resource, req.count);
    timed("record_usage", start, result)
}

fn apply_record(
    state: &AppState,
    tenant_id: TenantId,
    resource: &str,
    count: u64,
) -> ApiResult<Json<RecordUsageResponse>> {
    let resource: ResourceKey = resource
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown resource: {resource}")))?;

    if count == 0 || count > MAX_RECORD_COUNT {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {MAX_RECORD_COUNT}"
        )));
    }

    match state.store.record_usage(tenant_id, resource, count, Utc::now())? {
        RecordOutcome::Recorded { counters, limit } => {
            metrics::counter!("subscription_usage_recorded_total", "resource" => resource.as_str())
                .increment(count);
            Ok(Json(RecordUsageResponse {
                resource,
                current: counters.get(resource),
                limit,
            }))
        }
        RecordOutcome::Denied(check) => {
            metrics::counter!("subscription_limit_denials_total", "resource" => resource.as_str())
                .increment(1);
            tracing::info!(tenant_id = %tenant_id, %resource, count, "Usage limit reached");
            Err(ApiError::Forbidden(check.reason.unwrap_or_else(|| {
                format!("{resource} limit exceeded. Upgrade your plan.")
            })))
        }
    }
}

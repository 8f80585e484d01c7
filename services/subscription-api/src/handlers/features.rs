//! Feature access handlers

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::extractors::SessionTenant;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FeatureAccessResponse {
    pub feature: String,
    pub enabled: bool,
}

/// GET /api/features/{feature}
///
/// 200 when the tenant's plan includes the feature, otherwise 403 with the
/// reason. Unknown feature names are denied.
#[instrument(skip(state))]
pub async fn check_feature(
    State(state): State<AppState>,
    SessionTenant(tenant_id): SessionTenant,
    Path(feature): Path<String>,
) -> ApiResult<Json<FeatureAccessResponse>> {
    let check = state.store.check_feature(tenant_id, &feature, Utc::now());
    let result = if check.enabled { "allowed" } else { "denied" };
    metrics::counter!("subscription_feature_checks_total", "result" => result).increment(1);

    if !check.enabled {
        return Err(ApiError::Forbidden(check.reason.unwrap_or_else(|| {
            format!("Feature '{feature}' not available in your plan")
        })));
    }

    Ok(Json(FeatureAccessResponse {
        feature,
        enabled: true,
    }))
}

//! Axum extractors for session authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;

use nitilens_types::TenantId;

use crate::error::ApiError;
use crate::state::AppState;

/// Tenant identified by the request's bearer session token
#[derive(Debug, Clone, Copy)]
pub struct SessionTenant(pub TenantId);

impl<S> FromRequestParts<S> for SessionTenant
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = extract_token(parts)?;

        app_state
            .store
            .tenant_for_session(token)
            .map(SessionTenant)
            .ok_or_else(|| {
                tracing::debug!("Unknown session token");
                ApiError::InvalidToken
            })
    }
}

/// Extract the bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Err(ApiError::MissingToken);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("Invalid Authorization header encoding".into()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingToken)
}

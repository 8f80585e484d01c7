//! NitiLens Subscription API
//!
//! Serves the plan catalog, per-tenant usage and plan mutations for the
//! feature gates and the subscription page.
//!
//! ## REST Endpoints
//!
//! - `GET /api/subscription/current` - Current plan and term
//! - `GET /api/subscription/usage` - Usage snapshot
//! - `POST /api/subscription/usage/{resource}` - Record usage against a limit
//! - `GET /api/subscription/plans` - Plan catalog (public)
//! - `POST /api/subscription/upgrade` - Change plan
//! - `POST /api/subscription/cancel` - Turn off auto-renewal
//! - `GET /api/features/{feature}` - Server-side feature check
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;
pub mod store;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{health, ready};
pub use crate::config::{Config, ConfigError};
pub use crate::error::{ApiError, ApiResult};
pub use crate::state::AppState;
pub use crate::store::{RecordOutcome, StoreError, SubscriptionStore, Tenant};

/// Build the HTTP router
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api = Router::new()
        // Subscription routes
        .route("/subscription/current", get(handlers::get_current))
        .route("/subscription/plans", get(handlers::list_plans))
        .route("/subscription/upgrade", post(handlers::upgrade))
        .route("/subscription/cancel", post(handlers::cancel))
        // Usage routes
        .route("/subscription/usage", get(handlers::get_usage))
        .route("/subscription/usage/{resource}", post(handlers::record_usage))
        // Feature checks
        .route("/features/{feature}", get(handlers::check_feature));

    // Health routes (no timeout)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .nest("/api", api)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

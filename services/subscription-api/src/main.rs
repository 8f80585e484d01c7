//! Subscription API server binary

use std::net::SocketAddr;

use chrono::Utc;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use nitilens_types::PlanTier;
use subscription_api::{build_router, AppState, Config};

const DEMO_TENANT_NAME: &str = "Demo Organization";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("subscription_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NitiLens Subscription API");

    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        term_days = config.subscription_term.num_days(),
        "Configuration loaded"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let state = AppState::new(config.clone());

    if let Some(token) = config.demo_session_token.as_deref() {
        let tenant_id = state
            .store
            .create_tenant(DEMO_TENANT_NAME, PlanTier::Pro, Utc::now());
        state.store.insert_session(token, tenant_id);
        tracing::info!(tenant_id = %tenant_id, "Demo tenant seeded");
    }

    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Everything is in memory; most operations finish well under 10ms
    let latency_buckets = &[0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("subscription_operation_duration_seconds".to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    metrics::describe_counter!(
        "subscription_upgrades_total",
        "Total plan changes by target plan"
    );
    metrics::describe_counter!(
        "subscription_cancellations_total",
        "Total subscriptions with auto-renewal turned off"
    );
    metrics::describe_counter!(
        "subscription_usage_recorded_total",
        "Total usage units recorded by resource"
    );
    metrics::describe_counter!(
        "subscription_limit_denials_total",
        "Total usage records refused by a plan limit"
    );
    metrics::describe_counter!(
        "subscription_feature_checks_total",
        "Total server-side feature checks by result"
    );
    metrics::describe_histogram!(
        "subscription_operation_duration_seconds",
        "Subscription operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

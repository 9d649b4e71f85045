//! Metrics and health HTTP surface (§10.4). Reduced from the teacher's
//! `metrics.rs` + `web.rs` `AppState` pattern to exactly what §6/§7 require
//! of the core: a Prometheus exposition endpoint and the health check the
//! core itself is responsible for computing (the full dashboard/query API
//! is explicitly out of scope).

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tracing::info;

use crate::coordinator::HealthHandle;

/// Installs the global Prometheus recorder. Must be called once, before any
/// `metrics::counter!`/`gauge!`/`histogram!` call site runs.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full("cycle_duration_seconds".to_string()),
            &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        )
        .expect("failed to set buckets for cycle_duration_seconds")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Zeroes every metric this core emits so they appear in Prometheus queries
/// before the first cycle completes, the same rationale as the teacher's
/// `initialize_run_metrics` (§4.6, §4.9, §4.10 side effects).
pub fn initialize_core_metrics() {
    metrics::counter!("core_cycles_total").absolute(0);
    metrics::counter!("core_cycle_failures_total").absolute(0);
    metrics::counter!("core_filter_rejections_total").absolute(0);
    metrics::counter!("core_landings_detected_total").absolute(0);
    metrics::counter!("core_flights_completed_total", "method" => "landing").absolute(0);
    metrics::counter!("core_flights_completed_total", "method" => "timeout").absolute(0);
    metrics::counter!("core_flights_completed_total", "method" => "manual").absolute(0);
    metrics::counter!("core_frequency_matches_total").absolute(0);
    metrics::gauge!("core_buffer_pilots").set(0.0);
    metrics::gauge!("core_buffer_controllers").set(0.0);
    metrics::gauge!("core_feed_consecutive_failures").set(0.0);
}

#[derive(Clone)]
struct MetricsState {
    handle: PrometheusHandle,
    health: HealthHandle,
}

async fn healthz_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    let operational = state.health.is_operational();
    let body = match state.health.last_flush_timestamp() {
        Some(ts) => format!(
            "{{\"status\":\"{}\",\"last_flush\":\"{}\"}}",
            if operational { "operational" } else { "degraded" },
            ts.to_rfc3339()
        ),
        None => format!(
            "{{\"status\":\"{}\",\"last_flush\":null}}",
            if operational { "operational" } else { "degraded" }
        ),
    };
    let status = if operational {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, body)
}

async fn metrics_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    state.handle.render()
}

/// Serves `/healthz` and `/metrics` until `cancel` fires (§5 "Cancellation").
pub async fn serve(
    bind_addr: SocketAddr,
    handle: PrometheusHandle,
    health: HealthHandle,
    cancel: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let state = MetricsState { handle, health };
    let app = Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "metrics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

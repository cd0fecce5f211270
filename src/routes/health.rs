//! Health check routes
//!
//! Provides health and readiness endpoints for the gateway.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::models::HealthResponse;

/// Upstream probes give up quickly so a slow upstream cannot stall probes
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Whether the upstream answers at all. Any HTTP status counts: the base URL
/// itself usually has no route.
async fn upstream_reachable(state: &AppState) -> bool {
    state
        .http_client
        .get(&state.config.upstream.base_url)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .map_err(|e| tracing::warn!("Upstream probe failed: {}", e.without_url()))
        .is_ok()
}

/// Health check endpoint
///
/// GET /health
///
/// Returns the health status of the gateway including upstream reachability.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reachable = upstream_reachable(&state).await;

    Json(HealthResponse {
        status: if reachable { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: if reachable { "reachable" } else { "unreachable" }.to_string(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
///
/// Returns 200 if the upstream can be reached.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if upstream_reachable(&state).await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

/// Liveness check endpoint
///
/// GET /live
///
/// Simple liveness probe - returns 200 if the process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

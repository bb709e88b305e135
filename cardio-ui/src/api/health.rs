//! Liveness and diagnostics

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::buildinfo::get_build_info;
use crate::audio::AudioRegistryStats;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Browsers currently attached to `/events`
    pub sse_clients: usize,
    pub audio: AudioRegistryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
///
/// Always 200 while the process serves requests; backend reachability is
/// reported separately by `/api/backend`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = cardio_common::time::elapsed_ms(state.startup_time) / 1000;

    Json(HealthResponse {
        status: "ok",
        module: "cardio-ui",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        sse_clients: state.event_bus.subscriber_count(),
        audio: state.audio.stats(),
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/buildinfo", get(get_build_info))
}

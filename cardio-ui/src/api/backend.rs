//! Inference backend status

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub base_url: String,
    /// Any HTTP answer from `/health`
    pub reachable: bool,
    /// `/health` answered 200
    pub status_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/backend
pub async fn backend_status(State(state): State<AppState>) -> Json<BackendStatus> {
    let base_url = state.backend.base_url().to_string();

    let (reachable, status_ok, error) = match state.backend.health().await {
        Ok(ok) => (true, ok, None),
        Err(e) => {
            debug!(error = %e, "Backend health probe failed");
            (false, false, Some(e.user_message()))
        }
    };

    let metadata = if reachable {
        match state.backend.metadata().await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "Backend metadata unavailable");
                None
            }
        }
    } else {
        None
    };

    Json(BackendStatus {
        base_url,
        reachable,
        status_ok,
        metadata,
        error,
    })
}

pub fn backend_routes() -> Router<AppState> {
    Router::new().route("/api/backend", get(backend_status))
}

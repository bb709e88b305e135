//! Analysis submission, tab selection and view state

use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use cardio_common::events::UiEvent;
use cardio_common::time::elapsed_ms;
use tracing::{debug, info, warn};

use crate::client::ClientError;
use crate::controller::{AnalysisRequest, ControllerError, ViewSnapshot, VisualizationTab};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(start_analysis))
        .route("/api/analyze", post(analyze_json))
        .route("/api/state", get(get_state))
        .route("/tab/:tab", post(select_tab))
}

/// POST /analyze
///
/// Starts the analysis in the background and redirects straight back; the
/// page shows the loading state and reloads when the SSE stream reports the
/// outcome. A rejected start (no files) is recorded in the view.
pub async fn start_analysis(State(state): State<AppState>) -> Redirect {
    let begun = state.view.write().await.begin_analysis();

    match begun {
        Ok(request) => {
            announce_start(&state, &request);
            tokio::spawn(run_analysis(state.clone(), request));
        }
        Err(e) => debug!(error = %e, "Analysis not started"),
    }

    Redirect::to("/")
}

/// POST /api/analyze
///
/// Same flow, awaited; answers with the resulting view state. The request
/// runs in its own task, so a disconnect does not abandon the analysis.
pub async fn analyze_json(State(state): State<AppState>) -> ApiResult<Json<ViewSnapshot>> {
    let request = {
        let mut view = state.view.write().await;
        if view.is_analyzing() {
            return Err(ControllerError::AnalysisInProgress.into());
        }
        view.begin_analysis()?
    };

    announce_start(&state, &request);
    // Detached so the view still leaves Analyzing if this caller goes away
    tokio::spawn(run_analysis(state.clone(), request))
        .await
        .map_err(|e| ApiError::Internal(format!("analysis task failed: {}", e)))??;

    let snapshot = state.view.read().await.snapshot();
    Ok(Json(snapshot))
}

fn announce_start(state: &AppState, request: &AnalysisRequest) {
    info!(
        ecg = request.ecg.as_ref().map(|f| f.name.as_str()),
        pcg = request.pcg.as_ref().map(|f| f.name.as_str()),
        "Analysis started"
    );
    state.event_bus.emit_lossy(UiEvent::AnalysisStarted {
        has_ecg: request.ecg.is_some(),
        has_pcg: request.pcg.is_some(),
        timestamp: chrono::Utc::now(),
    });
}

/// Send `request` to the backend and apply the outcome to the view
///
/// The view lock is not held while the request is in flight.
pub async fn run_analysis(state: AppState, request: AnalysisRequest) -> Result<(), ClientError> {
    let outcome = state
        .backend
        .predict(request.ecg.as_ref(), request.pcg.as_ref())
        .await;
    let status = outcome.as_ref().map(|_| ()).map_err(Clone::clone);

    let dropped_fields = state.view.write().await.complete_analysis(outcome);
    let elapsed = elapsed_ms(request.started_at);

    match &status {
        Ok(()) => {
            info!(elapsed_ms = elapsed, dropped_fields, "Analysis completed");
            state.event_bus.emit_lossy(UiEvent::AnalysisCompleted {
                dropped_fields,
                elapsed_ms: elapsed,
                timestamp: chrono::Utc::now(),
            });
        }
        Err(e) => {
            warn!(elapsed_ms = elapsed, error = %e, "Analysis failed");
            state.record_error(e.to_string()).await;
            state.event_bus.emit_lossy(UiEvent::AnalysisFailed {
                message: e.user_message(),
                timestamp: chrono::Utc::now(),
            });
        }
    }

    status
}

/// GET /api/state
pub async fn get_state(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.view.read().await.snapshot())
}

/// POST /tab/:tab
pub async fn select_tab(State(state): State<AppState>, Path(tab): Path<String>) -> ApiResult<Redirect> {
    let tab: VisualizationTab = tab.parse().map_err(ApiError::BadRequest)?;
    state.view.write().await.select_tab(tab);
    Ok(Redirect::to("/"))
}

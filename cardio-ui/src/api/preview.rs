//! CSV preview modal actions

use axum::{extract::State, response::Redirect, routing::post, Router};
use tracing::debug;

use crate::AppState;

pub fn preview_routes() -> Router<AppState> {
    Router::new()
        .route("/csv-preview", post(open_preview))
        .route("/csv-preview/close", post(close_preview))
}

/// POST /csv-preview
///
/// A parse failure is shown on the page, so this always redirects.
pub async fn open_preview(State(state): State<AppState>) -> Redirect {
    if let Err(e) = state.view.write().await.open_csv_preview() {
        debug!(error = %e, "CSV preview not opened");
    }
    Redirect::to("/")
}

/// POST /csv-preview/close
pub async fn close_preview(State(state): State<AppState>) -> Redirect {
    state.view.write().await.close_csv_preview();
    Redirect::to("/")
}

//! Audio playback and chart images

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::warn;
use uuid::Uuid;

use crate::charts::{ChartError, ChartKind};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/audio/:id", get(serve_audio))
        .route("/charts/:kind", get(serve_chart))
}

/// GET /audio/:id
///
/// 404 once the URL has been revoked.
pub async fn serve_audio(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
    let blob = state
        .audio
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("audio {}", id)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        blob.bytes,
    )
        .into_response())
}

/// GET /charts/:kind
///
/// PNG of the current result's chart; 404 when there is no result or the
/// result has no data for it.
pub async fn serve_chart(State(state): State<AppState>, Path(kind): Path<String>) -> ApiResult<Response> {
    let kind: ChartKind = kind.parse().map_err(ApiError::NotFound)?;
    let result = state
        .view
        .read()
        .await
        .result()
        .cloned()
        .ok_or_else(|| ApiError::NotFound("no analysis result".to_string()))?;

    let charts = state.charts.clone();
    let png = tokio::task::spawn_blocking(move || {
        charts
            .capture(kind, &result)
            .and_then(|image| image.to_png())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("chart task failed: {}", e)))?;

    let png = match png {
        Ok(png) => png,
        Err(ChartError::NoData(kind)) => {
            return Err(ApiError::NotFound(format!("no {} data", kind.slug())));
        }
        Err(e) => {
            warn!(chart = kind.slug(), error = %e, "Chart rendering failed");
            return Err(ApiError::Internal(e.to_string()));
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    )
        .into_response())
}

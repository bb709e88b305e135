//! PDF report download

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use cardio_common::events::UiEvent;
use tracing::error;

use crate::error::ApiResult;
use crate::report::{ReportError, ReportGenerator};
use crate::AppState;

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/report", get(download_report))
}

/// GET /report
///
/// Builds the report for the current result and sends it as an attachment.
pub async fn download_report(State(state): State<AppState>) -> ApiResult<Response> {
    let input = state.view.write().await.begin_report()?;

    // The flag is reset inside the task so a dropped download cannot leave
    // it set
    let charts = state.charts.clone();
    let view = state.view.clone();
    let generated = tokio::spawn(async move {
        let generated =
            tokio::task::spawn_blocking(move || ReportGenerator::generate(&input, charts.as_ref()))
                .await
                .map_err(|e| ReportError::Task(e.to_string()))
                .and_then(|result| result);
        view.write().await.finish_report();
        generated
    })
    .await
    .map_err(|e| ReportError::Task(e.to_string()))
    .and_then(|result| result);

    let report = match generated {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Report generation failed");
            state.record_error(e.to_string()).await;
            return Err(e.into());
        }
    };

    state.event_bus.emit_lossy(UiEvent::ReportGenerated {
        pages: report.page_count,
        charts_included: report.charts_included.len(),
        charts_skipped: report.charts_skipped.len(),
        timestamp: chrono::Utc::now(),
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.bytes,
    )
        .into_response())
}

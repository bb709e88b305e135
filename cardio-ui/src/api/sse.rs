//! Server-Sent Events for live page status

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events
///
/// Streams:
/// - ConnectionStatus (once, on connect)
/// - FilesSelected
/// - AnalysisStarted / AnalysisCompleted / AnalysisFailed
/// - ReportGenerated
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    cardio_common::sse::create_event_sse_stream(&state.event_bus, "cardio-ui")
}

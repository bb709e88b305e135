//! SSE stream over the [`EventBus`]

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::events::{EventBus, UiEvent};

/// Keep-alive comment interval
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

fn to_sse(event: &UiEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!(event = event.event_type(), error = %e, "Dropping unserializable SSE event");
            None
        }
    }
}

/// Stream every [`UiEvent`] to one browser
///
/// The first message is `ConnectionStatus: connected`. A client that falls
/// behind the bus skips the missed events and keeps streaming; the stream
/// ends when the bus is dropped.
pub fn create_event_sse_stream(
    event_bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(service = service_name, "SSE client connected");
    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(sse) = to_sse(&event) {
                        yield Ok(sse);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!(service = service_name, missed, "SSE client lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}

//! Event types for the CardioSense event system
//!
//! Provides UI event definitions and the EventBus used to push view changes
//! to connected browsers over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which input slot a file was selected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Ecg,
    Pcg,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Ecg => "ecg",
            Modality::Pcg => "pcg",
        }
    }
}

/// UI events
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiEvent {
    /// A file was placed into an input slot
    FilesSelected {
        modality: Modality,
        file_name: String,
        timestamp: DateTime<Utc>,
    },

    /// An analysis request was sent to the backend
    AnalysisStarted {
        has_ecg: bool,
        has_pcg: bool,
        timestamp: DateTime<Utc>,
    },

    /// Backend returned a result
    AnalysisCompleted {
        /// Number of response fields dropped by validation
        dropped_fields: usize,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Analysis request failed
    AnalysisFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A PDF report was produced
    ReportGenerated {
        pages: usize,
        charts_included: usize,
        charts_skipped: usize,
        timestamp: DateTime<Utc>,
    },
}

impl UiEvent {
    /// SSE event name
    pub fn event_type(&self) -> &str {
        match self {
            UiEvent::FilesSelected { .. } => "FilesSelected",
            UiEvent::AnalysisStarted { .. } => "AnalysisStarted",
            UiEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            UiEvent::AnalysisFailed { .. } => "AnalysisFailed",
            UiEvent::ReportGenerated { .. } => "ReportGenerated",
        }
    }
}

/// Broadcast channel for UI events
///
/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: UiEvent) -> Result<usize, broadcast::error::SendError<UiEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// No open browser tab is the common case for a demo service.
    pub fn emit_lossy(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

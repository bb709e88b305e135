//! cardio-ui library - CardioSense presentation layer
//!
//! Serves the upload/result page for the cardiac risk demo, forwards the
//! selected ECG/PCG files to the inference backend, and renders risk scores,
//! waveform charts and PDF reports from the returned prediction.

pub mod api;
pub mod audio;
pub mod charts;
pub mod client;
pub mod controller;
pub mod csv_preview;
pub mod error;
pub mod report;
pub mod uploads;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use cardio_common::events::EventBus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::audio::AudioUrlRegistry;
use crate::charts::{ChartCapture, PlottersCapture};
use crate::client::PredictionBackend;
use crate::controller::ViewController;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The single view session
    pub view: Arc<RwLock<ViewController>>,
    pub backend: Arc<dyn PredictionBackend>,
    pub charts: Arc<dyn ChartCapture>,
    /// Playback URLs for the selected PCG file
    pub audio: Arc<AudioUrlRegistry>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn PredictionBackend>, event_bus: EventBus) -> Self {
        let audio = AudioUrlRegistry::new();
        Self {
            view: Arc::new(RwLock::new(ViewController::new(Arc::clone(&audio)))),
            backend,
            charts: Arc::new(PlottersCapture::default()),
            audio,
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the chart rasterizer
    pub fn with_chart_capture(mut self, charts: Arc<dyn ChartCapture>) -> Self {
        self.charts = charts;
        self
    }

    /// Remember `message` for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML page + static assets)
        .merge(api::ui_routes())
        // Form actions
        .merge(api::upload_routes())
        .merge(api::analysis_routes())
        .merge(api::preview_routes())
        // Media and downloads
        .merge(api::media_routes())
        .merge(api::report_routes())
        // Diagnostics
        .merge(api::backend_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

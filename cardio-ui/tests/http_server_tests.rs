//! Router-level tests for cardio-ui
//!
//! Drives the full router with `oneshot` against a fake backend that counts
//! its calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use cardio_common::events::{EventBus, UiEvent};
use cardio_common::{PlotPoint, PredictionResponse};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use cardio_ui::charts::{ChartCapture, ChartError, ChartKind, PlottersCapture, RasterImage};
use cardio_ui::client::{ClientError, PredictionBackend, NETWORK_MESSAGE, NO_FILES_MESSAGE};
use cardio_ui::uploads::UploadedFile;
use cardio_ui::{build_router, AppState};

struct FakeBackend {
    calls: AtomicUsize,
    outcome: Result<PredictionResponse, ClientError>,
    delay: Duration,
}

impl FakeBackend {
    fn new(outcome: Result<PredictionResponse, ClientError>) -> Arc<Self> {
        Self::slow(outcome, Duration::ZERO)
    }

    /// Answers only after `delay`
    fn slow(outcome: Result<PredictionResponse, ClientError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome,
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionBackend for FakeBackend {
    async fn predict(
        &self,
        _ecg: Option<&UploadedFile>,
        _pcg: Option<&UploadedFile>,
    ) -> Result<PredictionResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }

    async fn health(&self) -> Result<bool, ClientError> {
        Ok(true)
    }

    async fn metadata(&self) -> Result<Value, ClientError> {
        Ok(serde_json::json!({ "model": "fake" }))
    }

    fn base_url(&self) -> &str {
        "http://fake-backend"
    }
}

fn sample_response() -> PredictionResponse {
    PredictionResponse {
        ecg_risk: Some(0.82),
        pcg_risk: Some(0.31),
        combined_risk: Some(0.64),
        ecg_plot_data: Some(
            (0..50)
                .map(|i| PlotPoint::new(i as f64 * 0.004, (i as f64 / 5.0).sin()))
                .collect(),
        ),
        ecg_heatmap: Some((0..50).map(|i| i as f64 / 50.0).collect()),
        pcg_waveform_data: Some((0..100).map(|i| (i as f64 / 7.0).cos()).collect()),
        ..Default::default()
    }
}

/// Test helper: router plus the state and backend behind it
fn create_test_app(
    outcome: Result<PredictionResponse, ClientError>,
) -> (Router, AppState, Arc<FakeBackend>) {
    let backend = FakeBackend::new(outcome);
    let state = AppState::new(backend.clone(), EventBus::new(32));
    (build_router(state.clone()), state, backend)
}

fn multipart_upload(uri: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "cardio-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn state_json(app: &Router) -> Value {
    body_json(app.clone().oneshot(get("/api/state")).await.unwrap()).await
}

/// Poll `/api/state` until `key` is false, or give up after 5 s
async fn wait_until_cleared(app: &Router, key: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let state = state_json(app).await;
        if state[key] == false || tokio::time::Instant::now() >= deadline {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Sleeps before each capture
struct SlowCapture {
    delay: Duration,
    inner: PlottersCapture,
}

impl ChartCapture for SlowCapture {
    fn capture(&self, kind: ChartKind, result: &PredictionResponse) -> Result<RasterImage, ChartError> {
        std::thread::sleep(self.delay);
        self.inner.capture(kind, result)
    }
}

async fn upload_ecg(app: &Router) {
    let response = app
        .clone()
        .oneshot(multipart_upload("/files/ecg", "patient_ecg.csv", "text/csv", b"t,v\n0,1\n1,2\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// ========================================
// Diagnostics
// ========================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "cardio-ui");
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_backend_status_reports_metadata() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let json = body_json(app.oneshot(get("/api/backend")).await.unwrap()).await;
    assert_eq!(json["reachable"], true);
    assert_eq!(json["status_ok"], true);
    assert_eq!(json["metadata"]["model"], "fake");
    assert_eq!(json["base_url"], "http://fake-backend");
}

#[tokio::test]
async fn test_static_assets_served() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let css = app.clone().oneshot(get("/static/cardio-ui.css")).await.unwrap();
    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(css.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");

    let js = app.oneshot(get("/static/app.js")).await.unwrap();
    assert_eq!(js.status(), StatusCode::OK);
}

// ========================================
// Submission without files
// ========================================

#[tokio::test]
async fn test_submit_without_files_makes_no_backend_call() {
    let (app, _, backend) = create_test_app(Ok(sample_response()));

    let response = app.clone().oneshot(post("/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.clone().oneshot(post("/api/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], NO_FILES_MESSAGE);

    // Give any stray spawned task a chance to run
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(backend.calls(), 0);

    let state = state_json(&app).await;
    assert_eq!(state["phase"], "error");
    assert_eq!(state["error"], NO_FILES_MESSAGE);
    assert_eq!(state["error_kind"], "validation");
}

// ========================================
// Selection and analysis
// ========================================

#[tokio::test]
async fn test_upload_selects_file() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    upload_ecg(&app).await;

    let state = state_json(&app).await;
    assert_eq!(state["phase"], "files_selected");
    assert_eq!(state["ecg_file"]["name"], "patient_ecg.csv");
    assert_eq!(state["can_submit"], true);
    assert!(state["pcg_file"].is_null());
}

#[tokio::test]
async fn test_upload_without_file_name_rejected() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let response = app
        .clone()
        .oneshot(multipart_upload("/files/ecg", "", "text/csv", b""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state_json(&app).await["phase"], "idle");
}

#[tokio::test]
async fn test_analysis_renders_result() {
    let (app, _, backend) = create_test_app(Ok(sample_response()));
    upload_ecg(&app).await;

    let response = app.clone().oneshot(post("/api/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(backend.calls(), 1);
    assert_eq!(json["phase"], "result_ready");
    assert_eq!(json["risk_cards"][0]["label"], "HIGH RISK");
    assert_eq!(json["risk_cards"][0]["percentage"], "82.0%");
    assert_eq!(json["risk_cards"][1]["label"], "LOW RISK");
    assert_eq!(json["active_tab"], "ecg");

    let page = app.clone().oneshot(get("/")).await.unwrap();
    let html = String::from_utf8(body_bytes(page).await).unwrap();
    assert!(html.contains("HIGH RISK"));
    assert!(html.contains("/charts/ecg.png"));
    assert!(html.contains("Download PDF Report"));
}

#[tokio::test]
async fn test_background_analysis_announces_completion() {
    let (app, state, backend) = create_test_app(Ok(sample_response()));
    let mut events = state.event_bus.subscribe();
    upload_ecg(&app).await;

    let response = app.clone().oneshot(post("/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let completed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(UiEvent::AnalysisCompleted { dropped_fields, .. }) => break dropped_fields,
                Ok(_) => continue,
                Err(e) => panic!("event bus closed: {e}"),
            }
        }
    })
    .await
    .expect("analysis did not complete");

    assert_eq!(completed, 0);
    assert_eq!(backend.calls(), 1);
    assert_eq!(state_json(&app).await["is_analyzing"], false);
}

#[tokio::test]
async fn test_backend_failure_shows_single_message() {
    let (app, _, _) = create_test_app(Err(ClientError::Network("connection refused".into())));
    upload_ecg(&app).await;

    let response = app.clone().oneshot(post("/api/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let state = state_json(&app).await;
    assert_eq!(state["phase"], "error");
    assert_eq!(state["error"], NETWORK_MESSAGE);
    assert_eq!(state["is_analyzing"], false);

    let health = body_json(app.oneshot(get("/health")).await.unwrap()).await;
    assert!(health["last_error"].as_str().is_some());
}

#[tokio::test]
async fn test_tab_selection() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let response = app.clone().oneshot(post("/tab/spectrogram")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(state_json(&app).await["active_tab"], "spectrogram");

    let response = app.clone().oneshot(post("/tab/heart")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========================================
// Media
// ========================================

#[tokio::test]
async fn test_replacing_pcg_revokes_old_audio_url() {
    let (app, state, _) = create_test_app(Ok(sample_response()));

    app.clone()
        .oneshot(multipart_upload("/files/pcg", "first.wav", "audio/wav", b"RIFF1"))
        .await
        .unwrap();
    let first_url = state_json(&app).await["audio_url"].as_str().unwrap().to_string();

    let audio = app.clone().oneshot(get(&first_url)).await.unwrap();
    assert_eq!(audio.status(), StatusCode::OK);
    assert_eq!(audio.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(body_bytes(audio).await, b"RIFF1");

    app.clone()
        .oneshot(multipart_upload("/files/pcg", "second.wav", "audio/wav", b"RIFF2"))
        .await
        .unwrap();
    let second_url = state_json(&app).await["audio_url"].as_str().unwrap().to_string();
    assert_ne!(first_url, second_url);

    let stale = app.clone().oneshot(get(&first_url)).await.unwrap();
    assert_eq!(stale.status(), StatusCode::NOT_FOUND);

    let stats = state.audio.stats();
    assert_eq!(stats.live, 1);
    assert_eq!(stats.peak_live, 1);
}

#[tokio::test]
async fn test_chart_png_served_for_result() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let before = app.clone().oneshot(get("/charts/ecg.png")).await.unwrap();
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    upload_ecg(&app).await;
    app.clone().oneshot(post("/api/analyze")).await.unwrap();

    let chart = app.clone().oneshot(get("/charts/ecg.png")).await.unwrap();
    assert_eq!(chart.status(), StatusCode::OK);
    assert_eq!(chart.headers()[header::CONTENT_TYPE], "image/png");
    assert!(body_bytes(chart).await.starts_with(b"\x89PNG"));

    // No spectrogram in the sample response
    let missing = app.oneshot(get("/charts/spectrogram.png")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ========================================
// CSV preview
// ========================================

#[tokio::test]
async fn test_csv_preview_opens_and_closes() {
    let (app, _, _) = create_test_app(Ok(sample_response()));
    upload_ecg(&app).await;

    app.clone().oneshot(post("/csv-preview")).await.unwrap();
    let state = state_json(&app).await;
    assert_eq!(state["csv_modal_open"], true);
    assert_eq!(state["csv_preview"]["total_rows"], 3);

    let page = app.clone().oneshot(get("/")).await.unwrap();
    let html = String::from_utf8(body_bytes(page).await).unwrap();
    assert!(html.contains("patient_ecg.csv"));
    assert!(html.contains("<td>t</td>"));

    app.clone().oneshot(post("/csv-preview/close")).await.unwrap();
    assert_eq!(state_json(&app).await["csv_modal_open"], false);
}

// ========================================
// Report
// ========================================

#[tokio::test]
async fn test_report_requires_result() {
    let (app, _, _) = create_test_app(Ok(sample_response()));

    let response = app.oneshot(get("/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_download() {
    let (app, _, _) = create_test_app(Ok(sample_response()));
    upload_ecg(&app).await;
    app.clone().oneshot(post("/api/analyze")).await.unwrap();

    let response = app.clone().oneshot(get("/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"CardioSense_Report_"));
    assert!(disposition.ends_with(".pdf\""));

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF-"));

    assert_eq!(state_json(&app).await["generating_report"], false);
}

// ========================================
// Abandoned requests
// ========================================

#[tokio::test]
async fn test_dropped_analysis_request_still_completes() {
    let backend = FakeBackend::slow(Ok(sample_response()), Duration::from_millis(300));
    let state = AppState::new(backend.clone(), EventBus::new(32));
    let app = build_router(state.clone());
    upload_ecg(&app).await;

    // Caller gives up long before the backend answers
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        app.clone().oneshot(post("/api/analyze")),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(state_json(&app).await["is_analyzing"], true);

    let view = wait_until_cleared(&app, "is_analyzing").await;
    assert_eq!(view["is_analyzing"], false);
    assert_eq!(view["phase"], "result_ready");
    assert_eq!(backend.calls(), 1);

    // The view accepts new work again
    let response = app
        .clone()
        .oneshot(multipart_upload("/files/pcg", "heart.wav", "audio/wav", b"RIFF....WAVE"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = app.clone().oneshot(post("/api/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_dropped_report_download_releases_flag() {
    let backend = FakeBackend::new(Ok(sample_response()));
    let state = AppState::new(backend, EventBus::new(32)).with_chart_capture(Arc::new(SlowCapture {
        delay: Duration::from_millis(200),
        inner: PlottersCapture::new(300, 100),
    }));
    let app = build_router(state.clone());
    upload_ecg(&app).await;
    let response = app.clone().oneshot(post("/api/analyze")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), app.clone().oneshot(get("/report"))).await;
    assert!(abandoned.is_err());
    assert_eq!(state_json(&app).await["generating_report"], true);

    let view = wait_until_cleared(&app, "generating_report").await;
    assert_eq!(view["generating_report"], false);

    let response = app.oneshot(get("/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
}

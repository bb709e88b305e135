//! Page stylesheet and script, embedded at compile time

use axum::{http::header, response::IntoResponse};

const CARDIO_UI_CSS: &str = include_str!("../../../static/cardio-ui.css");
const APP_JS: &str = include_str!("../../../static/app.js");

fn asset(content_type: &'static str, body: &'static str) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        ],
        body,
    )
}

/// GET /static/cardio-ui.css
pub async fn serve_cardio_ui_css() -> impl IntoResponse {
    asset("text/css; charset=utf-8", CARDIO_UI_CSS)
}

/// GET /static/app.js
///
/// File input auto-submit, SSE status badge, reload on analysis outcome
pub async fn serve_app_js() -> impl IntoResponse {
    asset("application/javascript; charset=utf-8", APP_JS)
}

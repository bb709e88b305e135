//! UI Routes - the CardioSense page
//!
//! # Structure
//! - **Static Assets** (`static_assets`): CSS/JS file serving
//! - **Root Page** (`root`): upload/result page
//! - **Render** (`render`): HTML fragments built from the view snapshot

use axum::{routing::get, Router};

use crate::AppState;

pub mod render;
mod root;
mod static_assets;

pub use root::render_page;
use root::root_page;
use static_assets::{serve_app_js, serve_cardio_ui_css};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        // Page routes
        .route("/", get(root_page))
        // Static assets
        .route("/static/cardio-ui.css", get(serve_cardio_ui_css))
        .route("/static/app.js", get(serve_app_js))
}

//! HTTP API handlers for cardio-ui
//!
//! The page is server-rendered; every user action is a form POST that
//! updates the shared [`ViewController`](crate::controller::ViewController)
//! and redirects back to `/`. JSON endpoints expose the same state for
//! scripts and tests.

pub mod analysis;
pub mod backend;
pub mod buildinfo;
pub mod health;
pub mod media;
pub mod preview;
pub mod report;
pub mod sse;
pub mod ui;
pub mod uploads;

pub use analysis::analysis_routes;
pub use backend::backend_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use preview::preview_routes;
pub use report::report_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
pub use uploads::upload_routes;

//! Root page handler - upload/result page

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};

use super::render::{escape_html, render_csv_modal, render_results, render_upload_section};
use crate::api::buildinfo::BuildInfo;
use crate::controller::ViewSnapshot;
use crate::report::DISCLAIMER;
use crate::AppState;

/// GET /
pub async fn root_page(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.view.read().await.snapshot();
    Html(render_page(&snapshot, &BuildInfo::current()))
}

/// Full page for `view`
pub fn render_page(view: &ViewSnapshot, build: &BuildInfo) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>CardioSense - Cardiac Analysis</title>
    <link rel="stylesheet" href="/static/cardio-ui.css">
</head>
<body data-phase="{phase}">
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>CardioSense <span id="connection-status" class="connection-status">Connecting...</span></h1>
                <div class="subtitle">ECG + PCG bimodal cardiac risk assessment</div>
            </div>
            <div class="header-right">
                <div class="build-info-line">v{version} [{git_hash}]</div>
                <div class="build-info-line">{build_timestamp} ({build_profile})</div>
            </div>
        </div>
    </header>
    <main class="container">
        {upload}
        {results}
    </main>
    {modal}
    <footer class="page-footer">{disclaimer}</footer>
    <script src="/static/app.js"></script>
</body>
</html>"#,
        phase = view.phase.as_str(),
        version = escape_html(&build.version),
        git_hash = escape_html(build.short_hash()),
        build_timestamp = escape_html(&build.build_timestamp),
        build_profile = escape_html(&build.build_profile),
        upload = render_upload_section(view),
        results = render_results(view),
        modal = render_csv_modal(view),
        disclaimer = DISCLAIMER,
    )
}

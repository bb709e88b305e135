//! File selection form actions

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Redirect,
    routing::post,
    Router,
};
use cardio_common::events::{Modality, UiEvent};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::uploads::UploadedFile;
use crate::AppState;

/// Largest accepted upload; long PCG recordings run to tens of MB
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "file";

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/files/ecg", post(upload_ecg))
        .route("/files/pcg", post(upload_pcg))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .route("/files/clear", post(clear_files))
}

/// POST /files/ecg
pub async fn upload_ecg(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Redirect> {
    select(state, Modality::Ecg, multipart).await
}

/// POST /files/pcg
pub async fn upload_pcg(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Redirect> {
    select(state, Modality::Pcg, multipart).await
}

/// POST /files/clear
pub async fn clear_files(State(state): State<AppState>) -> ApiResult<Redirect> {
    state.view.write().await.clear_files()?;
    debug!("File selection cleared");
    Ok(Redirect::to("/"))
}

async fn select(state: AppState, modality: Modality, mut multipart: Multipart) -> ApiResult<Redirect> {
    let file = read_file_field(&mut multipart).await?;
    let file_name = file.name.clone();

    state.view.write().await.select_file(modality, file)?;

    state.event_bus.emit_lossy(UiEvent::FilesSelected {
        modality,
        file_name,
        timestamp: chrono::Utc::now(),
    });

    Ok(Redirect::to("/"))
}

/// Pull the `file` field out of a multipart body
///
/// Other fields are ignored. A field without a file name or without content
/// means nothing was chosen in the browser.
pub async fn read_file_field(multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("").trim().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if name.is_empty() || bytes.is_empty() {
            return Err(ApiError::BadRequest("No file selected".to_string()));
        }

        let file = UploadedFile::new(name, bytes);
        return Ok(match content_type {
            Some(content_type) => file.with_content_type(content_type),
            None => file,
        });
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

//! Uploaded input files held in view state

use axum::body::Bytes;
use serde::Serialize;

/// Content type assumed for ECG uploads without one
pub const DEFAULT_ECG_CONTENT_TYPE: &str = "text/csv";

/// Content type assumed for PCG uploads without one
pub const DEFAULT_PCG_CONTENT_TYPE: &str = "audio/wav";

/// A file the user selected in the browser
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Declared content type, or `fallback` when the browser sent none
    /// (or sent the uninformative `application/octet-stream`)
    pub fn content_type_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct,
            _ => fallback,
        }
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size_bytes: self.size(),
            size_display: format_bytes(self.size() as u64),
        }
    }
}

/// File metadata exposed to the page and the JSON state API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: usize,
    pub size_display: String,
}

/// Format bytes for human-readable display
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

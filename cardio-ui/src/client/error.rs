//! Error kinds for the inference backend client
//!
//! Every failure of an analysis request collapses into one of four kinds so
//! the page can render a single message without inspecting transport details.

use serde::Serialize;
use thiserror::Error;

pub const NO_FILES_MESSAGE: &str = "Please upload at least one file (ECG or PCG)";
pub const NETWORK_MESSAGE: &str = "Cannot connect to server. Please check if the backend is running.";
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred";

/// Longest server-supplied message surfaced verbatim
const MAX_SERVER_MESSAGE_LEN: usize = 500;

/// Backend client errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected locally before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend answered with an error status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Request sent but no response arrived (refused, reset, timed out)
    #[error("Network error: {0}")]
    Network(String),

    /// Anything else: malformed body, request construction failure
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Serializable discriminant for the JSON state API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Server,
    Network,
    Unknown,
}

impl ClientError {
    pub fn no_files() -> Self {
        ClientError::Validation(NO_FILES_MESSAGE.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// The one line shown to the user
    ///
    /// Network and unknown failures use fixed wording; their details are
    /// only logged.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(message) => message.clone(),
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Network(_) => NETWORK_MESSAGE.to_string(),
            ClientError::Unknown(_) => GENERIC_MESSAGE.to_string(),
        }
    }

    /// Map a failed `send()` onto the error kinds
    pub(crate) fn from_send_error(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::Unknown(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            ClientError::Network(err.to_string())
        } else {
            ClientError::Unknown(err.to_string())
        }
    }

    /// Build a `Server` error from status and raw body
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        ClientError::Server {
            status,
            message: server_message(status, body),
        }
    }
}

/// Extract the server-supplied message from an error body
///
/// Looks for `detail` (FastAPI), `message` and `error` keys in a JSON body,
/// then falls back to the raw text, then to a generic status line.
pub fn server_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json_message(&json) {
            return truncate(message);
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') && !text.starts_with('<') {
        return truncate(text.to_string());
    }

    format!("Server error: {}", status)
}

fn json_message(json: &serde_json::Value) -> Option<String> {
    for key in ["detail", "message", "error"] {
        match json.get(key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string())
            }
            // FastAPI validation errors: [{"loc": [...], "msg": "...", ...}]
            Some(serde_json::Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            Some(nested) if nested.is_object() => {
                if let Some(message) = json_message(nested) {
                    return Some(message);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate(message: String) -> String {
    if message.chars().count() <= MAX_SERVER_MESSAGE_LEN {
        return message;
    }
    let mut cut: String = message.chars().take(MAX_SERVER_MESSAGE_LEN).collect();
    cut.push('…');
    cut
}

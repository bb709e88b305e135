//! Inference backend client
//!
//! Wraps the three backend endpoints:
//! - `POST /predict` multipart upload of the ECG and/or PCG file
//! - `GET /health` liveness
//! - `GET /` backend metadata
//!
//! The prediction response is returned as received; validation happens in
//! the view controller so that rejected fields can be reported on the page.

mod error;

pub use error::{
    server_message, ClientError, ErrorKind, GENERIC_MESSAGE, NETWORK_MESSAGE, NO_FILES_MESSAGE,
};

use async_trait::async_trait;
use cardio_common::PredictionResponse;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::uploads::{UploadedFile, DEFAULT_ECG_CONTENT_TYPE, DEFAULT_PCG_CONTENT_TYPE};

/// Inference can take minutes; this is the only bound on request lifetime
pub const PREDICT_TIMEOUT: Duration = Duration::from_secs(300);

/// Health and metadata probes should answer quickly
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Multipart part names expected by the backend
pub const ECG_PART: &str = "ecg_file";
pub const PCG_PART: &str = "pcg_file";

const USER_AGENT: &str = concat!("cardio-ui/", env!("CARGO_PKG_VERSION"));

/// The operations the view needs from an inference backend
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Submit the selected files for analysis
    async fn predict(
        &self,
        ecg: Option<&UploadedFile>,
        pcg: Option<&UploadedFile>,
    ) -> Result<PredictionResponse, ClientError>;

    /// `Ok(true)` iff the backend health endpoint answered 200
    async fn health(&self) -> Result<bool, ClientError>;

    /// Arbitrary backend metadata from its root endpoint
    async fn metadata(&self) -> Result<serde_json::Value, ClientError>;

    fn base_url(&self) -> &str;
}

/// HTTP client for the inference backend
pub struct PredictionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    /// Create a client with the default five minute prediction timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, PREDICT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unknown(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read an error body and turn it into a `Server` error
    async fn server_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ClientError::from_status(status, &body)
    }
}

fn file_part(file: &UploadedFile, fallback_type: &str) -> Result<Part, ClientError> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(file.content_type_or(fallback_type))
        .map_err(|e| ClientError::Unknown(format!("invalid content type for {}: {}", file.name, e)))
}

#[async_trait]
impl PredictionBackend for PredictionClient {
    async fn predict(
        &self,
        ecg: Option<&UploadedFile>,
        pcg: Option<&UploadedFile>,
    ) -> Result<PredictionResponse, ClientError> {
        if ecg.is_none() && pcg.is_none() {
            return Err(ClientError::no_files());
        }

        let mut form = Form::new();
        if let Some(file) = ecg {
            form = form.part(ECG_PART, file_part(file, DEFAULT_ECG_CONTENT_TYPE)?);
        }
        if let Some(file) = pcg {
            form = form.part(PCG_PART, file_part(file, DEFAULT_PCG_CONTENT_TYPE)?);
        }

        info!(
            ecg = ecg.map(|f| f.name.as_str()),
            pcg = pcg.map(|f| f.name.as_str()),
            "Submitting files for prediction"
        );

        let response = self
            .http_client
            .post(self.endpoint("/predict"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Prediction request failed before a response arrived");
                ClientError::from_send_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::server_error(response).await;
            warn!(status = status.as_u16(), error = %err, "Backend rejected prediction request");
            return Err(err);
        }

        let prediction: PredictionResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Prediction response is not valid JSON for the expected shape");
            ClientError::Unknown(format!("invalid response from backend: {}", e))
        })?;

        debug!(
            ecg_risk = ?prediction.ecg_risk,
            pcg_risk = ?prediction.pcg_risk,
            combined_risk = ?prediction.combined_risk,
            "Prediction received"
        );

        Ok(prediction)
    }

    async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http_client
            .get(self.endpoint("/health"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(ClientError::from_send_error)?;

        Ok(response.status() == reqwest::StatusCode::OK)
    }

    async fn metadata(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http_client
            .get(self.endpoint("/"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(ClientError::from_send_error)?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Unknown(format!("invalid metadata response: {}", e)))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

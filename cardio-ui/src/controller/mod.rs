//! Upload/result view controller
//!
//! Owns everything the page shows: the selected files, the loading flags, the
//! latest analysis result, the active visualization tab and the CSV modal.
//!
//! Phase transitions:
//!
//! ```text
//! Idle/Error --select--> FilesSelected --begin--> Analyzing --ok--> ResultReady
//!                                                     \--err--> Error
//! ```
//!
//! `begin_analysis` and `complete_analysis` are split so the HTTP layer can
//! release the view lock while the backend request is in flight.

mod phase;

pub use phase::{AnalysisPhase, VisualizationTab};

use cardio_common::events::Modality;
use cardio_common::risk::format_percentage;
use cardio_common::{PredictionResponse, RiskLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::{AudioHandle, AudioUrlRegistry};
use crate::client::{ClientError, ErrorKind, PredictionBackend};
use crate::csv_preview::CsvPreview;
use crate::report::ReportInput;
use crate::uploads::{FileSummary, UploadedFile};

/// Controller-level rejections (not analysis failures)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    #[error("No ECG file selected")]
    NoEcgFile,

    #[error("Could not preview CSV: {0}")]
    Preview(String),

    #[error("No analysis result available")]
    NoResult,

    #[error("A report is already being generated")]
    ReportInProgress,
}

/// Owned copies of the files for one backend request
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ecg: Option<UploadedFile>,
    pub pcg: Option<UploadedFile>,
    pub started_at: DateTime<Utc>,
}

/// One risk score as displayed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskCard {
    pub key: &'static str,
    pub title: &'static str,
    pub score: Option<f64>,
    pub percentage: String,
    pub level: RiskLevel,
    pub label: &'static str,
    pub color: &'static str,
}

impl RiskCard {
    fn new(key: &'static str, title: &'static str, score: Option<f64>) -> Self {
        let level = RiskLevel::from_score(score);
        Self {
            key,
            title,
            score,
            percentage: format_percentage(score),
            level,
            label: level.label(),
            color: level.color_hex(),
        }
    }
}

/// ECG, PCG, combined, in display order
pub fn risk_cards(result: &PredictionResponse) -> Vec<RiskCard> {
    vec![
        RiskCard::new("ecg", "ECG Risk", result.ecg_risk),
        RiskCard::new("pcg", "PCG Risk", result.pcg_risk),
        RiskCard::new("combined", "Combined Risk", result.combined_risk),
    ]
}

/// Serializable view model
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub phase: AnalysisPhase,
    pub is_analyzing: bool,
    pub can_submit: bool,
    pub ecg_file: Option<FileSummary>,
    pub pcg_file: Option<FileSummary>,
    pub audio_url: Option<String>,
    pub result: Option<PredictionResponse>,
    pub risk_cards: Vec<RiskCard>,
    pub contract_warnings: Vec<String>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub active_tab: VisualizationTab,
    pub csv_modal_open: bool,
    pub csv_preview: Option<CsvPreview>,
    pub csv_error: Option<String>,
    pub generating_report: bool,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    /// The file selection changed after the shown result was produced
    pub result_is_stale: bool,
}

/// File names a result was computed from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AnalyzedFiles {
    ecg: Option<String>,
    pcg: Option<String>,
}

impl AnalyzedFiles {
    fn of(ecg: Option<&UploadedFile>, pcg: Option<&UploadedFile>) -> Self {
        Self {
            ecg: ecg.map(|f| f.name.clone()),
            pcg: pcg.map(|f| f.name.clone()),
        }
    }
}

/// Upload/result view state machine
pub struct ViewController {
    audio_registry: Arc<AudioUrlRegistry>,
    ecg_file: Option<UploadedFile>,
    pcg_file: Option<UploadedFile>,
    audio: Option<AudioHandle>,
    phase: AnalysisPhase,
    result: Option<PredictionResponse>,
    /// Files of the request in flight
    pending_files: Option<AnalyzedFiles>,
    /// Files behind `result`
    result_files: AnalyzedFiles,
    result_is_stale: bool,
    contract_warnings: Vec<String>,
    error: Option<String>,
    error_kind: Option<ErrorKind>,
    active_tab: VisualizationTab,
    csv_preview: Option<CsvPreview>,
    csv_error: Option<String>,
    csv_modal_open: bool,
    generating_report: bool,
    last_analyzed_at: Option<DateTime<Utc>>,
}

impl ViewController {
    pub fn new(audio_registry: Arc<AudioUrlRegistry>) -> Self {
        Self {
            audio_registry,
            ecg_file: None,
            pcg_file: None,
            audio: None,
            phase: AnalysisPhase::Idle,
            result: None,
            pending_files: None,
            result_files: AnalyzedFiles::default(),
            result_is_stale: false,
            contract_warnings: Vec::new(),
            error: None,
            error_kind: None,
            active_tab: VisualizationTab::default(),
            csv_preview: None,
            csv_error: None,
            csv_modal_open: false,
            generating_report: false,
            last_analyzed_at: None,
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn phase(&self) -> AnalysisPhase {
        self.phase
    }

    pub fn is_analyzing(&self) -> bool {
        self.phase == AnalysisPhase::Analyzing
    }

    pub fn has_files(&self) -> bool {
        self.ecg_file.is_some() || self.pcg_file.is_some()
    }

    pub fn ecg_file(&self) -> Option<&UploadedFile> {
        self.ecg_file.as_ref()
    }

    pub fn pcg_file(&self) -> Option<&UploadedFile> {
        self.pcg_file.as_ref()
    }

    pub fn audio_url(&self) -> Option<String> {
        self.audio.as_ref().map(AudioHandle::url)
    }

    pub fn result(&self) -> Option<&PredictionResponse> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn active_tab(&self) -> VisualizationTab {
        self.active_tab
    }

    pub fn csv_preview(&self) -> Option<&CsvPreview> {
        self.csv_preview.as_ref()
    }

    pub fn csv_error(&self) -> Option<&str> {
        self.csv_error.as_deref()
    }

    pub fn is_csv_modal_open(&self) -> bool {
        self.csv_modal_open
    }

    pub fn is_generating_report(&self) -> bool {
        self.generating_report
    }

    // ========================================
    // File selection
    // ========================================

    /// Put `file` into the given slot
    pub fn select_file(&mut self, modality: Modality, file: UploadedFile) -> Result<(), ControllerError> {
        match modality {
            Modality::Ecg => self.select_ecg(file),
            Modality::Pcg => self.select_pcg(file),
        }
    }

    pub fn select_ecg(&mut self, file: UploadedFile) -> Result<(), ControllerError> {
        self.ensure_idle_for_selection()?;
        info!(file = %file.name, size = file.size(), "ECG file selected");
        self.ecg_file = Some(file);
        self.after_selection();
        Ok(())
    }

    /// Replaces the PCG file and its playback URL
    ///
    /// The previous URL is revoked before the new one is created.
    pub fn select_pcg(&mut self, file: UploadedFile) -> Result<(), ControllerError> {
        self.ensure_idle_for_selection()?;
        info!(file = %file.name, size = file.size(), "PCG file selected");

        if let Some(previous) = self.audio.take() {
            previous.release();
        }
        self.audio = Some(self.audio_registry.create(&file));
        self.pcg_file = Some(file);
        self.after_selection();
        Ok(())
    }

    /// Drop both files and the playback URL
    pub fn clear_files(&mut self) -> Result<(), ControllerError> {
        self.ensure_idle_for_selection()?;
        if let Some(previous) = self.audio.take() {
            previous.release();
        }
        self.ecg_file = None;
        self.pcg_file = None;
        self.mark_result_stale();
        self.reset_csv();
        self.error = None;
        self.error_kind = None;
        if self.phase != AnalysisPhase::ResultReady {
            self.phase = AnalysisPhase::Idle;
        }
        Ok(())
    }

    fn ensure_idle_for_selection(&self) -> Result<(), ControllerError> {
        if self.is_analyzing() {
            return Err(ControllerError::AnalysisInProgress);
        }
        Ok(())
    }

    fn mark_result_stale(&mut self) {
        if self.result.is_some() {
            self.result_is_stale = true;
        }
    }

    fn after_selection(&mut self) {
        self.mark_result_stale();
        self.error = None;
        self.error_kind = None;
        self.reset_csv();
        // A shown result stays until the next one replaces it
        if matches!(self.phase, AnalysisPhase::Idle | AnalysisPhase::Error) {
            self.phase = AnalysisPhase::FilesSelected;
        }
    }

    fn reset_csv(&mut self) {
        self.csv_preview = None;
        self.csv_error = None;
        self.csv_modal_open = false;
    }

    // ========================================
    // Analysis
    // ========================================

    /// Validate and enter `Analyzing`
    ///
    /// With no files selected this records the validation error and returns
    /// it without touching the network.
    pub fn begin_analysis(&mut self) -> Result<AnalysisRequest, ClientError> {
        if self.is_analyzing() {
            return Err(ClientError::Validation(
                ControllerError::AnalysisInProgress.to_string(),
            ));
        }

        if !self.has_files() {
            let err = ClientError::no_files();
            self.error = Some(err.user_message());
            self.error_kind = Some(err.kind());
            self.phase = AnalysisPhase::Error;
            debug!("Analysis rejected: no files selected");
            return Err(err);
        }

        self.error = None;
        self.error_kind = None;
        self.phase = AnalysisPhase::Analyzing;
        self.pending_files = Some(AnalyzedFiles::of(self.ecg_file.as_ref(), self.pcg_file.as_ref()));

        Ok(AnalysisRequest {
            ecg: self.ecg_file.clone(),
            pcg: self.pcg_file.clone(),
            started_at: Utc::now(),
        })
    }

    /// Apply the backend outcome; always leaves `Analyzing`
    ///
    /// Successful responses are validated first. Returns the number of
    /// response fields dropped for breaking the contract.
    pub fn complete_analysis(
        &mut self,
        outcome: Result<PredictionResponse, ClientError>,
    ) -> usize {
        let analyzed = self.pending_files.take().unwrap_or_default();
        match outcome {
            Ok(response) => {
                let (clean, violations) = response.sanitized();
                for violation in &violations {
                    warn!(field = violation.field(), "Dropping response field: {}", violation);
                }

                self.contract_warnings = violations.iter().map(ToString::to_string).collect();
                self.result = Some(clean);
                self.result_files = analyzed;
                self.result_is_stale = false;
                self.active_tab = VisualizationTab::default();
                self.error = None;
                self.error_kind = None;
                self.phase = AnalysisPhase::ResultReady;
                self.last_analyzed_at = Some(Utc::now());
                violations.len()
            }
            Err(err) => {
                self.error = Some(err.user_message());
                self.error_kind = Some(err.kind());
                self.phase = AnalysisPhase::Error;
                0
            }
        }
    }

    /// Run one analysis to completion against `backend`
    pub async fn submit(&mut self, backend: &dyn PredictionBackend) -> Result<(), ClientError> {
        let request = self.begin_analysis()?;
        let outcome = backend
            .predict(request.ecg.as_ref(), request.pcg.as_ref())
            .await;
        let status = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
        self.complete_analysis(outcome);
        status
    }

    // ========================================
    // Tabs and CSV modal
    // ========================================

    pub fn select_tab(&mut self, tab: VisualizationTab) {
        self.active_tab = tab;
    }

    /// Parse the selected ECG file and open the modal
    ///
    /// Failures are kept in `csv_error`; the analysis state is untouched.
    pub fn open_csv_preview(&mut self) -> Result<(), ControllerError> {
        let Some(file) = &self.ecg_file else {
            self.csv_error = Some(ControllerError::NoEcgFile.to_string());
            return Err(ControllerError::NoEcgFile);
        };

        match CsvPreview::from_bytes(file.name.clone(), &file.bytes) {
            Ok(preview) => {
                debug!(rows = preview.total_rows, "CSV preview parsed");
                self.csv_preview = Some(preview);
                self.csv_error = None;
                self.csv_modal_open = true;
                Ok(())
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "CSV preview failed");
                let err = ControllerError::Preview(e.to_string());
                self.csv_preview = None;
                self.csv_error = Some(err.to_string());
                self.csv_modal_open = false;
                Err(err)
            }
        }
    }

    /// Closing keeps the parsed table so reopening needs no reparse
    pub fn close_csv_preview(&mut self) {
        self.csv_modal_open = false;
    }

    // ========================================
    // Report
    // ========================================

    /// Mark a report as in progress and collect its input
    pub fn begin_report(&mut self) -> Result<ReportInput, ControllerError> {
        if self.generating_report {
            return Err(ControllerError::ReportInProgress);
        }
        let result = self.result.clone().ok_or(ControllerError::NoResult)?;
        self.generating_report = true;

        Ok(ReportInput {
            result,
            ecg_file_name: self.result_files.ecg.clone(),
            pcg_file_name: self.result_files.pcg.clone(),
            generated_at: Utc::now(),
        })
    }

    pub fn finish_report(&mut self) {
        self.generating_report = false;
    }

    // ========================================
    // View model
    // ========================================

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            phase: self.phase,
            is_analyzing: self.is_analyzing(),
            can_submit: self.has_files() && !self.is_analyzing(),
            ecg_file: self.ecg_file.as_ref().map(UploadedFile::summary),
            pcg_file: self.pcg_file.as_ref().map(UploadedFile::summary),
            audio_url: self.audio_url(),
            result: self.result.clone(),
            risk_cards: self.result.as_ref().map(risk_cards).unwrap_or_default(),
            contract_warnings: self.contract_warnings.clone(),
            error: self.error.clone(),
            error_kind: self.error_kind,
            active_tab: self.active_tab,
            csv_modal_open: self.csv_modal_open,
            csv_preview: self.csv_preview.clone(),
            csv_error: self.csv_error.clone(),
            generating_report: self.generating_report,
            last_analyzed_at: self.last_analyzed_at,
            result_is_stale: self.result_is_stale,
        }
    }
}

//! View state enums

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where the upload/analyze flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    FilesSelected,
    Analyzing,
    ResultReady,
    Error,
}

impl AnalysisPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisPhase::Idle => "idle",
            AnalysisPhase::FilesSelected => "files_selected",
            AnalysisPhase::Analyzing => "analyzing",
            AnalysisPhase::ResultReady => "result_ready",
            AnalysisPhase::Error => "error",
        }
    }
}

/// Visible visualization panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationTab {
    #[default]
    Ecg,
    Pcg,
    Spectrogram,
}

impl VisualizationTab {
    pub const ALL: [VisualizationTab; 3] = [
        VisualizationTab::Ecg,
        VisualizationTab::Pcg,
        VisualizationTab::Spectrogram,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            VisualizationTab::Ecg => "ecg",
            VisualizationTab::Pcg => "pcg",
            VisualizationTab::Spectrogram => "spectrogram",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            VisualizationTab::Ecg => "ECG Waveform",
            VisualizationTab::Pcg => "PCG Waveform",
            VisualizationTab::Spectrogram => "Spectrogram",
        }
    }
}

impl FromStr for VisualizationTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecg" => Ok(VisualizationTab::Ecg),
            "pcg" => Ok(VisualizationTab::Pcg),
            "spectrogram" => Ok(VisualizationTab::Spectrogram),
            other => Err(format!("unknown tab: {}", other)),
        }
    }
}

//! Risk score labeling
//!
//! Shared by the web page risk cards and the PDF report so both always agree.

use serde::Serialize;

/// Scores strictly above this are labeled high risk
pub const RISK_THRESHOLD: f64 = 0.5;

/// Binary label for a model risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Low,
    /// Score absent (modality not submitted, or dropped by validation)
    Unavailable,
}

impl RiskLevel {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s > RISK_THRESHOLD => RiskLevel::High,
            Some(_) => RiskLevel::Low,
            None => RiskLevel::Unavailable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH RISK",
            RiskLevel::Low => "LOW RISK",
            RiskLevel::Unavailable => "N/A",
        }
    }

    /// CSS hex color for the card accent
    pub fn color_hex(&self) -> &'static str {
        match self {
            RiskLevel::High => "#dc2626",
            RiskLevel::Low => "#16a34a",
            RiskLevel::Unavailable => "#6b7280",
        }
    }

    /// Same color as RGB components in [0, 1], for PDF drawing
    pub fn color_rgb(&self) -> (f32, f32, f32) {
        match self {
            RiskLevel::High => (0.863, 0.149, 0.149),
            RiskLevel::Low => (0.086, 0.639, 0.290),
            RiskLevel::Unavailable => (0.420, 0.447, 0.502),
        }
    }
}

/// "73.4%" or "N/A"
pub fn format_percentage(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.1}%", s * 100.0),
        None => "N/A".to_string(),
    }
}

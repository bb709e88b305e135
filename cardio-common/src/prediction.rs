//! Prediction response contract
//!
//! The inference backend returns a single JSON document per `/predict` call.
//! Every field is optional: which ones are present depends on whether an ECG
//! file, a PCG file, or both were submitted. Consumers must treat an absent
//! field as "not available" rather than as an error.
//!
//! The backend is not fully trusted. [`PredictionResponse::validate`] checks
//! the invariants the renderer relies on (probabilities in [0,1], heatmaps
//! aligned with their waveform) and [`PredictionResponse::sanitized`] drops
//! the fields that break them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{Error, Result};

pub const FIELD_ECG_RISK: &str = "ecg_risk";
pub const FIELD_PCG_RISK: &str = "pcg_risk";
pub const FIELD_COMBINED_RISK: &str = "combined_risk";
pub const FIELD_ECG_PLOT: &str = "ecg_plot_data";
pub const FIELD_PCG_WAVEFORM: &str = "pcg_waveform_data";
pub const FIELD_PCG_SPECTROGRAM: &str = "pcg_spectrogram";
pub const FIELD_ECG_HEATMAP: &str = "ecg_heatmap";
pub const FIELD_PCG_HEATMAP: &str = "pcg_heatmap";

/// One ECG sample as plotted: x is time (or index), y is amplitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

impl PlotPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// The backend has emitted both `{"x":..,"y":..}` objects and `[x, y]` pairs.
impl<'de> Deserialize<'de> for PlotPoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Object { x: f64, y: f64 },
            Pair([f64; 2]),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Object { x, y } => PlotPoint { x, y },
            Wire::Pair([x, y]) => PlotPoint { x, y },
        })
    }
}

/// Response body of `POST /predict`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub ecg_risk: Option<f64>,
    #[serde(default)]
    pub pcg_risk: Option<f64>,
    #[serde(default)]
    pub combined_risk: Option<f64>,
    #[serde(default)]
    pub ecg_plot_data: Option<Vec<PlotPoint>>,
    #[serde(default)]
    pub pcg_waveform_data: Option<Vec<f64>>,
    /// Base64 image, optionally with a `data:image/...;base64,` header
    #[serde(default)]
    pub pcg_spectrogram: Option<String>,
    #[serde(default)]
    pub ecg_heatmap: Option<Vec<f64>>,
    #[serde(default)]
    pub pcg_heatmap: Option<Vec<f64>>,
}

/// A broken invariant in a backend response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractViolation {
    RiskOutOfRange {
        field: &'static str,
        value: f64,
    },
    HeatmapLengthMismatch {
        field: &'static str,
        heatmap_len: usize,
        waveform_len: usize,
    },
    HeatmapValueOutOfRange {
        field: &'static str,
        index: usize,
        value: f64,
    },
    NonFiniteSample {
        field: &'static str,
        index: usize,
    },
    UndecodableSpectrogram {
        reason: String,
    },
}

impl ContractViolation {
    /// Name of the response field the violation applies to
    pub fn field(&self) -> &'static str {
        match self {
            ContractViolation::RiskOutOfRange { field, .. }
            | ContractViolation::HeatmapLengthMismatch { field, .. }
            | ContractViolation::HeatmapValueOutOfRange { field, .. }
            | ContractViolation::NonFiniteSample { field, .. } => field,
            ContractViolation::UndecodableSpectrogram { .. } => FIELD_PCG_SPECTROGRAM,
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::RiskOutOfRange { field, value } => {
                write!(f, "{} = {} is not a probability in [0, 1]", field, value)
            }
            ContractViolation::HeatmapLengthMismatch {
                field,
                heatmap_len,
                waveform_len,
            } => write!(
                f,
                "{} has {} values but its waveform has {} samples",
                field, heatmap_len, waveform_len
            ),
            ContractViolation::HeatmapValueOutOfRange {
                field,
                index,
                value,
            } => write!(f, "{}[{}] = {} is outside [0, 1]", field, index, value),
            ContractViolation::NonFiniteSample { field, index } => {
                write!(f, "{}[{}] is not a finite number", field, index)
            }
            ContractViolation::UndecodableSpectrogram { reason } => {
                write!(f, "pcg_spectrogram is not decodable: {}", reason)
            }
        }
    }
}

impl PredictionResponse {
    pub fn has_ecg_waveform(&self) -> bool {
        self.ecg_plot_data.as_ref().is_some_and(|d| !d.is_empty())
    }

    pub fn has_pcg_waveform(&self) -> bool {
        self.pcg_waveform_data
            .as_ref()
            .is_some_and(|d| !d.is_empty())
    }

    pub fn has_spectrogram(&self) -> bool {
        self.pcg_spectrogram
            .as_ref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Raw image bytes of the spectrogram
    pub fn spectrogram_bytes(&self) -> Result<Vec<u8>> {
        let encoded = self
            .pcg_spectrogram
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("no spectrogram in response".to_string()))?;
        decode_embedded_image(encoded)
    }

    /// Spectrogram as a `data:` URI for direct use in an `<img src>`
    pub fn spectrogram_data_uri(&self) -> Option<String> {
        let encoded = self.pcg_spectrogram.as_deref()?.trim();
        if encoded.is_empty() {
            return None;
        }
        if encoded.starts_with("data:") {
            Some(encoded.to_string())
        } else {
            Some(format!("data:image/png;base64,{}", encoded))
        }
    }

    /// Check every invariant the renderer depends on
    pub fn validate(&self) -> Vec<ContractViolation> {
        let mut violations = Vec::new();

        for (field, value) in [
            (FIELD_ECG_RISK, self.ecg_risk),
            (FIELD_PCG_RISK, self.pcg_risk),
            (FIELD_COMBINED_RISK, self.combined_risk),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    violations.push(ContractViolation::RiskOutOfRange { field, value: v });
                }
            }
        }

        if let Some(points) = &self.ecg_plot_data {
            if let Some(index) = points
                .iter()
                .position(|p| !p.x.is_finite() || !p.y.is_finite())
            {
                violations.push(ContractViolation::NonFiniteSample {
                    field: FIELD_ECG_PLOT,
                    index,
                });
            }
        }
        if let Some(samples) = &self.pcg_waveform_data {
            if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
                violations.push(ContractViolation::NonFiniteSample {
                    field: FIELD_PCG_WAVEFORM,
                    index,
                });
            }
        }

        check_heatmap(
            FIELD_ECG_HEATMAP,
            self.ecg_heatmap.as_deref(),
            self.ecg_plot_data.as_ref().map(Vec::len),
            &mut violations,
        );
        check_heatmap(
            FIELD_PCG_HEATMAP,
            self.pcg_heatmap.as_deref(),
            self.pcg_waveform_data.as_ref().map(Vec::len),
            &mut violations,
        );

        if self.has_spectrogram() {
            if let Err(e) = self.spectrogram_bytes() {
                violations.push(ContractViolation::UndecodableSpectrogram {
                    reason: e.to_string(),
                });
            }
        }

        violations
    }

    /// Drop every field that violates the contract
    ///
    /// A waveform that is dropped takes its heatmap with it, since the
    /// heatmap has nothing left to align with.
    pub fn sanitized(mut self) -> (Self, Vec<ContractViolation>) {
        let violations = self.validate();
        for violation in &violations {
            match violation.field() {
                FIELD_ECG_RISK => self.ecg_risk = None,
                FIELD_PCG_RISK => self.pcg_risk = None,
                FIELD_COMBINED_RISK => self.combined_risk = None,
                FIELD_ECG_PLOT => {
                    self.ecg_plot_data = None;
                    self.ecg_heatmap = None;
                }
                FIELD_PCG_WAVEFORM => {
                    self.pcg_waveform_data = None;
                    self.pcg_heatmap = None;
                }
                FIELD_ECG_HEATMAP => self.ecg_heatmap = None,
                FIELD_PCG_HEATMAP => self.pcg_heatmap = None,
                FIELD_PCG_SPECTROGRAM => self.pcg_spectrogram = None,
                _ => {}
            }
        }
        (self, violations)
    }
}

fn check_heatmap(
    field: &'static str,
    heatmap: Option<&[f64]>,
    waveform_len: Option<usize>,
    violations: &mut Vec<ContractViolation>,
) {
    let Some(heatmap) = heatmap else {
        return;
    };

    if let Some(waveform_len) = waveform_len {
        if heatmap.len() != waveform_len {
            violations.push(ContractViolation::HeatmapLengthMismatch {
                field,
                heatmap_len: heatmap.len(),
                waveform_len,
            });
            return;
        }
    }

    if let Some(index) = heatmap
        .iter()
        .position(|v| !v.is_finite() || !(0.0..=1.0).contains(v))
    {
        violations.push(ContractViolation::HeatmapValueOutOfRange {
            field,
            index,
            value: heatmap[index],
        });
    }
}

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];

/// Decode a base64 PNG or JPEG, tolerating a `data:<mime>;base64,` prefix
pub fn decode_embedded_image(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| Error::Decode("data URI without payload".to_string()))?,
        None => trimmed,
    };
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| Error::Decode(format!("invalid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(Error::Decode("empty image payload".to_string()));
    }
    if !(bytes.starts_with(PNG_MAGIC) || bytes.starts_with(JPEG_MAGIC)) {
        return Err(Error::Decode("payload is not a PNG or JPEG image".to_string()));
    }
    Ok(bytes)
}

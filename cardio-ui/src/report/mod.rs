//! PDF report generation
//!
//! A report has a header, the risk assessment, the analyzed file names and
//! one section per available chart, followed by a footer on every page.
//! Charts are best-effort: a chart that cannot be captured is logged and
//! left out without failing the report.

pub mod layout;
pub mod pdf;

use cardio_common::time::{display_timestamp, iso_date};
use cardio_common::PredictionResponse;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::charts::{ChartCapture, ChartKind};
use crate::controller::risk_cards;
use layout::{Font, ReportLayout, MARGIN, MUTED_COLOR, TEXT_COLOR};

pub const REPORT_TITLE: &str = "CardioSense Cardiac Analysis Report";
pub const REPORT_SUBTITLE: &str = "ECG + PCG bimodal risk assessment";
pub const DISCLAIMER: &str =
    "This report is generated by an AI demo system and is not a medical diagnosis.";
pub const FAILURE_MESSAGE: &str = "Failed to generate report. Please try again.";
pub const NOT_PROVIDED: &str = "Not provided";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF assembly failed: {0}")]
    Render(String),

    #[error("Report task failed: {0}")]
    Task(String),
}

impl ReportError {
    /// Shown to the user whatever the cause
    pub fn user_message(&self) -> &'static str {
        FAILURE_MESSAGE
    }
}

/// Everything a report is built from
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub result: PredictionResponse,
    pub ecg_file_name: Option<String>,
    pub pcg_file_name: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ReportInput {
    pub fn filename(&self) -> String {
        report_filename(self.generated_at)
    }
}

/// A finished PDF
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub charts_included: Vec<ChartKind>,
    pub charts_skipped: Vec<ChartKind>,
}

/// `CardioSense_Report_<YYYY-MM-DD>.pdf`
pub fn report_filename(generated_at: DateTime<Utc>) -> String {
    format!("CardioSense_Report_{}.pdf", iso_date(generated_at))
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate(
        input: &ReportInput,
        capture: &dyn ChartCapture,
    ) -> Result<GeneratedReport, ReportError> {
        let (layout, charts_included, charts_skipped) = Self::layout(input, capture);
        let bytes = pdf::render(&layout)?;

        info!(
            pages = layout.page_count(),
            charts = charts_included.len(),
            skipped = charts_skipped.len(),
            size = bytes.len(),
            "Report generated"
        );

        Ok(GeneratedReport {
            filename: input.filename(),
            bytes,
            page_count: layout.page_count(),
            charts_included,
            charts_skipped,
        })
    }

    /// Place every section; returns the layout with included and skipped charts
    pub fn layout(
        input: &ReportInput,
        capture: &dyn ChartCapture,
    ) -> (ReportLayout, Vec<ChartKind>, Vec<ChartKind>) {
        let mut layout = ReportLayout::new();

        // ========================================
        // Header
        // ========================================
        layout.text(REPORT_TITLE, 20.0, Font::Bold, TEXT_COLOR);
        layout.gap(2.0);
        layout.text(REPORT_SUBTITLE, 11.0, Font::Regular, MUTED_COLOR);
        layout.text(
            format!("Generated: {}", display_timestamp(input.generated_at)),
            10.0,
            Font::Regular,
            MUTED_COLOR,
        );
        layout.gap(6.0);
        layout.rule();
        layout.gap(8.0);

        // ========================================
        // Risk assessment
        // ========================================
        layout.text("Risk Assessment", 14.0, Font::Bold, TEXT_COLOR);
        layout.gap(4.0);
        for card in risk_cards(&input.result) {
            let color = card.level.color_rgb();
            layout.columns(
                &[
                    (MARGIN, card.title.to_string(), Font::Regular, TEXT_COLOR),
                    (MARGIN + 160.0, card.percentage.clone(), Font::Bold, color),
                    (MARGIN + 260.0, card.label.to_string(), Font::Bold, color),
                ],
                12.0,
            );
        }
        layout.gap(12.0);

        // ========================================
        // Files
        // ========================================
        layout.text("Files Analyzed", 14.0, Font::Bold, TEXT_COLOR);
        layout.gap(4.0);
        for (label, name) in [
            ("ECG File:", input.ecg_file_name.as_deref()),
            ("PCG File:", input.pcg_file_name.as_deref()),
        ] {
            layout.columns(
                &[
                    (MARGIN, label.to_string(), Font::Regular, TEXT_COLOR),
                    (
                        MARGIN + 160.0,
                        name.unwrap_or(NOT_PROVIDED).to_string(),
                        Font::Regular,
                        if name.is_some() { TEXT_COLOR } else { MUTED_COLOR },
                    ),
                ],
                11.0,
            );
        }

        // ========================================
        // Charts
        // ========================================
        let mut included = Vec::new();
        let mut skipped = Vec::new();
        for kind in ChartKind::ALL {
            if !kind.is_available(&input.result) {
                debug!(chart = kind.slug(), "No data for chart; section omitted");
                continue;
            }
            match capture.capture(kind, &input.result) {
                Ok(image) => {
                    layout.gap(16.0);
                    // Keep the heading on the same page as its chart
                    let image_height = ReportLayout::content_width() * image.aspect_ratio();
                    layout.ensure_space(14.0 * 1.35 + 6.0 + image_height);
                    layout.text(kind.title(), 14.0, Font::Bold, TEXT_COLOR);
                    layout.gap(6.0);
                    layout.image(image);
                    included.push(kind);
                }
                Err(e) => {
                    warn!(chart = kind.slug(), error = %e, "Chart capture failed; section skipped");
                    skipped.push(kind);
                }
            }
        }

        layout.stamp_footer(DISCLAIMER);
        (layout, included, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartError, RasterImage};
    use chrono::TimeZone;

    struct SolidCapture;

    impl ChartCapture for SolidCapture {
        fn capture(&self, _kind: ChartKind, _result: &PredictionResponse) -> Result<RasterImage, ChartError> {
            RasterImage::new(30, 10, vec![90; 900])
        }
    }

    fn input(result: PredictionResponse) -> ReportInput {
        ReportInput {
            result,
            ecg_file_name: Some("patient_ecg.csv".to_string()),
            pcg_file_name: None,
            generated_at: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
        }
    }

    fn all_texts(layout: &ReportLayout) -> Vec<String> {
        layout
            .pages()
            .iter()
            .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_filename_uses_iso_date() {
        let name = input(PredictionResponse::default()).filename();
        assert!(name.starts_with("CardioSense_Report_2026-03-1"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_sections_in_order() {
        let result = PredictionResponse {
            ecg_risk: Some(0.8),
            ..Default::default()
        };
        let (layout, included, _) = ReportGenerator::layout(&input(result), &SolidCapture);
        let texts = all_texts(&layout);

        let pos = |needle: &str| texts.iter().position(|t| t == needle).unwrap();
        assert!(pos(REPORT_TITLE) < pos("Risk Assessment"));
        assert!(pos("Risk Assessment") < pos("Files Analyzed"));
        assert!(texts.contains(&"80.0%".to_string()));
        assert!(texts.contains(&"HIGH RISK".to_string()));
        assert!(texts.contains(&NOT_PROVIDED.to_string()));
        assert!(included.is_empty());
    }

    #[test]
    fn test_charts_follow_available_data() {
        let result = PredictionResponse {
            pcg_waveform_data: Some(vec![0.0, 1.0]),
            pcg_spectrogram: Some("AQID".to_string()),
            ..Default::default()
        };
        let (layout, included, skipped) = ReportGenerator::layout(&input(result), &SolidCapture);

        assert_eq!(included, vec![ChartKind::PcgWaveform, ChartKind::Spectrogram]);
        assert!(skipped.is_empty());
        assert_eq!(layout.images().len(), 2);
    }

    #[test]
    fn test_user_message_is_generic() {
        assert_eq!(ReportError::Render("xref".into()).user_message(), FAILURE_MESSAGE);
    }
}

//! End-to-end report generation

use cardio_common::{PlotPoint, PredictionResponse};
use chrono::Utc;

use cardio_ui::charts::{ChartCapture, ChartError, ChartKind, PlottersCapture, RasterImage};
use cardio_ui::report::layout::page_label;
use cardio_ui::report::{ReportGenerator, ReportInput, DISCLAIMER, NOT_PROVIDED, REPORT_TITLE};

/// Fails for one chart, delegates the rest
struct FlakyCapture {
    fails: ChartKind,
    inner: PlottersCapture,
}

impl ChartCapture for FlakyCapture {
    fn capture(&self, kind: ChartKind, result: &PredictionResponse) -> Result<RasterImage, ChartError> {
        if kind == self.fails {
            return Err(ChartError::Render("canvas lost".to_string()));
        }
        self.inner.capture(kind, result)
    }
}

fn full_result() -> PredictionResponse {
    PredictionResponse {
        ecg_risk: Some(0.7),
        pcg_risk: Some(0.2),
        combined_risk: Some(0.45),
        ecg_plot_data: Some((0..200).map(|i| PlotPoint::new(i as f64, (i as f64 / 9.0).sin())).collect()),
        ecg_heatmap: Some(vec![0.5; 200]),
        pcg_waveform_data: Some((0..400).map(|i| (i as f64 / 13.0).sin()).collect()),
        pcg_heatmap: Some(vec![0.1; 400]),
        pcg_spectrogram: None,
    }
}

fn input(result: PredictionResponse) -> ReportInput {
    ReportInput {
        result,
        ecg_file_name: Some("ecg.csv".to_string()),
        pcg_file_name: Some("heart.wav".to_string()),
        generated_at: Utc::now(),
    }
}

#[test]
fn test_report_without_chart_data_is_valid_pdf() {
    let result = PredictionResponse {
        ecg_risk: Some(0.3),
        ..Default::default()
    };
    let input = ReportInput {
        pcg_file_name: None,
        ..input(result)
    };

    let report = ReportGenerator::generate(&input, &PlottersCapture::default()).unwrap();

    assert!(report.charts_included.is_empty());
    assert!(report.charts_skipped.is_empty());
    assert_eq!(report.page_count, 1);
    assert!(report.filename.starts_with("CardioSense_Report_"));

    let doc = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let (layout, _, _) = ReportGenerator::layout(&input, &PlottersCapture::default());
    let texts: Vec<&str> = layout.pages()[0].texts().collect();
    assert!(texts.contains(&REPORT_TITLE));
    assert!(texts.contains(&"Risk Assessment"));
    assert!(texts.contains(&"Files Analyzed"));
    assert!(texts.contains(&NOT_PROVIDED));
    assert!(texts.contains(&DISCLAIMER));
}

#[test]
fn test_failed_capture_skips_only_that_chart() {
    let capture = FlakyCapture {
        fails: ChartKind::EcgWaveform,
        inner: PlottersCapture::new(600, 200),
    };

    let report = ReportGenerator::generate(&input(full_result()), &capture).unwrap();

    assert_eq!(report.charts_skipped, vec![ChartKind::EcgWaveform]);
    assert_eq!(report.charts_included, vec![ChartKind::PcgWaveform]);
    assert!(lopdf::Document::load_mem(&report.bytes).is_ok());
}

#[test]
fn test_footer_numbers_every_page() {
    // Tall charts force the chart sections onto later pages
    let capture = PlottersCapture::new(400, 400);
    let (layout, included, _) = ReportGenerator::layout(&input(full_result()), &capture);

    assert_eq!(included.len(), 2);
    let total = layout.page_count();
    assert!(total >= 2);

    for (i, page) in layout.pages().iter().enumerate() {
        let texts: Vec<&str> = page.texts().collect();
        assert!(texts.contains(&DISCLAIMER));
        assert!(texts.contains(&page_label(i + 1, total).as_str()));
    }

    let report = ReportGenerator::generate(&input(full_result()), &capture).unwrap();
    assert_eq!(report.page_count, total);
    let doc = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), total);
}

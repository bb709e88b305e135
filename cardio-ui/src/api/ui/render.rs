//! HTML fragments for the upload/result page
//!
//! Every function takes the view snapshot and returns markup; nothing here
//! touches shared state. All user-controlled text goes through
//! [`escape_html`].

use cardio_common::PredictionResponse;

use crate::controller::{AnalysisPhase, RiskCard, ViewSnapshot, VisualizationTab};
use crate::csv_preview::CsvPreview;
use crate::uploads::FileSummary;

pub const ECG_UNAVAILABLE: &str = "ECG waveform not available";
pub const PCG_UNAVAILABLE: &str = "PCG waveform not available";
pub const SPECTROGRAM_UNAVAILABLE: &str = "Spectrogram not available";
pub const PREVIOUS_RESULT_NOTE: &str = "Showing the previous result.";

/// Escape text for HTML body and attribute context
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ========================================
// Upload section
// ========================================

pub fn render_upload_section(view: &ViewSnapshot) -> String {
    let disabled = if view.is_analyzing { " disabled" } else { "" };

    let ecg_actions = if view.ecg_file.is_some() {
        format!(
            r#"<form method="post" action="/csv-preview" class="inline-form">
                <button type="submit" class="button secondary"{disabled}>Preview CSV</button>
            </form>"#
        )
    } else {
        String::new()
    };

    let csv_error = view
        .csv_error
        .as_deref()
        .map(|e| format!(r#"<p class="field-error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();

    let player = match &view.audio_url {
        Some(url) => format!(
            r#"<audio controls preload="metadata" src="{}" class="player"></audio>"#,
            escape_html(url)
        ),
        None => String::new(),
    };

    let clear = if view.ecg_file.is_some() || view.pcg_file.is_some() {
        format!(
            r#"<form method="post" action="/files/clear" class="inline-form">
                <button type="submit" class="button secondary"{disabled}>Clear files</button>
            </form>"#
        )
    } else {
        String::new()
    };

    let submit_label = if view.is_analyzing {
        r#"<span class="spinner"></span>Analyzing..."#
    } else {
        "Analyze"
    };
    let submit_disabled = if view.can_submit { "" } else { " disabled" };

    let error = view
        .error
        .as_deref()
        .map(|e| format!(r#"<div class="error-banner" role="alert">{}</div>"#, escape_html(e)))
        .unwrap_or_default();

    format!(
        r#"<section class="card upload">
    <h2>Upload Files</h2>
    <div class="upload-grid">
        <div class="upload-slot">
            <h3>ECG (CSV)</h3>
            <form method="post" action="/files/ecg" enctype="multipart/form-data" class="file-form">
                <input type="file" name="file" accept=".csv,text/csv"{disabled}>
                <button type="submit" class="button secondary"{disabled}>Select</button>
            </form>
            {ecg_file}
            {ecg_actions}
            {csv_error}
        </div>
        <div class="upload-slot">
            <h3>PCG (WAV)</h3>
            <form method="post" action="/files/pcg" enctype="multipart/form-data" class="file-form">
                <input type="file" name="file" accept=".wav,audio/wav"{disabled}>
                <button type="submit" class="button secondary"{disabled}>Select</button>
            </form>
            {pcg_file}
            {player}
        </div>
    </div>
    {error}
    <div class="actions">
        <form method="post" action="/analyze" class="inline-form">
            <button type="submit" class="button primary"{submit_disabled}>{submit_label}</button>
        </form>
        {clear}
    </div>
</section>"#,
        ecg_file = render_file_summary(view.ecg_file.as_ref()),
        pcg_file = render_file_summary(view.pcg_file.as_ref()),
    )
}

fn render_file_summary(file: Option<&FileSummary>) -> String {
    match file {
        Some(file) => format!(
            r#"<p class="file-summary"><strong>{}</strong> <span class="muted">({})</span></p>"#,
            escape_html(&file.name),
            file.size_display
        ),
        None => r#"<p class="file-summary muted">No file selected</p>"#.to_string(),
    }
}

// ========================================
// Results
// ========================================

pub fn render_results(view: &ViewSnapshot) -> String {
    let Some(result) = &view.result else {
        return String::new();
    };

    let warnings = if view.contract_warnings.is_empty() {
        String::new()
    } else {
        let items: String = view
            .contract_warnings
            .iter()
            .map(|w| format!("<li>{}</li>", escape_html(w)))
            .collect();
        format!(
            r#"<div class="warning-banner"><p>Some fields in the backend response were ignored:</p><ul>{}</ul></div>"#,
            items
        )
    };

    let stale = match view.phase {
        AnalysisPhase::Analyzing => false,
        AnalysisPhase::ResultReady => view.result_is_stale,
        _ => true,
    };
    let stale = if stale {
        format!(r#"<p class="muted">{}</p>"#, PREVIOUS_RESULT_NOTE)
    } else {
        String::new()
    };

    let report_button = if view.generating_report {
        r#"<span class="button secondary disabled"><span class="spinner"></span>Generating...</span>"#
            .to_string()
    } else {
        r#"<a class="button secondary" href="/report" download>Download PDF Report</a>"#.to_string()
    };

    let version = view
        .last_analyzed_at
        .map(|t| t.timestamp_millis())
        .unwrap_or_default();

    format!(
        r#"<section class="card results">
    <div class="results-header">
        <h2>Analysis Results</h2>
        {report_button}
    </div>
    {stale}
    {cards}
    {warnings}
    {tabs}
    <div class="panel">
        {panel}
    </div>
</section>"#,
        cards = render_risk_cards(&view.risk_cards),
        tabs = render_tabs(view.active_tab),
        panel = render_panel(view.active_tab, result, version),
    )
}

pub fn render_risk_cards(cards: &[RiskCard]) -> String {
    let cards: String = cards
        .iter()
        .map(|card| {
            format!(
                r#"<div class="risk-card" data-risk="{key}">
        <div class="risk-title">{title}</div>
        <div class="risk-value" style="color: {color}">{percentage}</div>
        <div class="risk-label" style="background-color: {color}">{label}</div>
    </div>"#,
                key = card.key,
                title = card.title,
                color = card.color,
                percentage = card.percentage,
                label = card.label,
            )
        })
        .collect();
    format!(r#"<div class="risk-grid">{}</div>"#, cards)
}

pub fn render_tabs(active: VisualizationTab) -> String {
    let tabs: String = VisualizationTab::ALL
        .iter()
        .map(|tab| {
            let class = if *tab == active { "tab active" } else { "tab" };
            format!(
                r#"<form method="post" action="/tab/{slug}" class="inline-form"><button type="submit" class="{class}">{title}</button></form>"#,
                slug = tab.slug(),
                class = class,
                title = tab.title(),
            )
        })
        .collect();
    format!(r#"<nav class="tabs">{}</nav>"#, tabs)
}

/// `version` busts the browser cache when a new result replaces the old one
pub fn render_panel(tab: VisualizationTab, result: &PredictionResponse, version: i64) -> String {
    match tab {
        VisualizationTab::Ecg if result.has_ecg_waveform() => chart_img("ecg", "ECG waveform", version),
        VisualizationTab::Ecg => unavailable(ECG_UNAVAILABLE),
        VisualizationTab::Pcg if result.has_pcg_waveform() => chart_img("pcg", "PCG waveform", version),
        VisualizationTab::Pcg => unavailable(PCG_UNAVAILABLE),
        VisualizationTab::Spectrogram => match result.spectrogram_data_uri() {
            Some(uri) => format!(
                r#"<img class="chart" alt="PCG spectrogram" src="{}">"#,
                escape_html(&uri)
            ),
            None => unavailable(SPECTROGRAM_UNAVAILABLE),
        },
    }
}

fn chart_img(slug: &str, alt: &str, version: i64) -> String {
    format!(
        r#"<img class="chart" alt="{alt}" src="/charts/{slug}.png?v={version}">"#,
        alt = alt,
        slug = slug,
        version = version
    )
}

fn unavailable(message: &str) -> String {
    format!(r#"<div class="unavailable">{}</div>"#, message)
}

// ========================================
// CSV modal
// ========================================

pub fn render_csv_modal(view: &ViewSnapshot) -> String {
    match (&view.csv_preview, view.csv_modal_open) {
        (Some(preview), true) => csv_modal(preview),
        _ => String::new(),
    }
}

fn csv_modal(preview: &CsvPreview) -> String {
    let rows: String = preview
        .rows
        .iter()
        .map(|row| {
            let cells: String = (0..preview.column_count)
                .map(|i| {
                    let value = row.get(i).map(String::as_str).unwrap_or("");
                    format!("<td>{}</td>", escape_html(value))
                })
                .collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();

    format!(
        r#"<div class="modal-backdrop">
    <div class="modal" role="dialog" aria-label="CSV preview">
        <div class="modal-header">
            <h3>{name}</h3>
            <form method="post" action="/csv-preview/close" class="inline-form">
                <button type="submit" class="button secondary">Close</button>
            </form>
        </div>
        <p class="muted">{note}</p>
        <div class="table-wrap">
            <table class="csv-table"><tbody>{rows}</tbody></table>
        </div>
    </div>
</div>"#,
        name = escape_html(&preview.file_name),
        note = preview.row_note(),
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioUrlRegistry;
    use crate::controller::ViewController;
    use crate::uploads::UploadedFile;

    fn view() -> ViewController {
        ViewController::new(AudioUrlRegistry::new())
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_submit_disabled_without_files() {
        let html = render_upload_section(&view().snapshot());
        assert!(html.contains(r#"class="button primary" disabled"#));
        assert!(html.contains("No file selected"));
    }

    #[test]
    fn test_file_names_are_escaped() {
        let mut view = view();
        view.select_ecg(UploadedFile::new("<script>.csv", b"1,2".to_vec()))
            .unwrap();
        let html = render_upload_section(&view.snapshot());
        assert!(html.contains("&lt;script&gt;.csv"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Preview CSV"));
    }

    #[test]
    fn test_pcg_selection_renders_player() {
        let mut view = view();
        view.select_pcg(UploadedFile::new("beat.wav", b"RIFF".to_vec()))
            .unwrap();
        let snapshot = view.snapshot();
        let html = render_upload_section(&snapshot);
        assert!(html.contains(&format!(r#"src="{}""#, snapshot.audio_url.unwrap())));
    }

    #[test]
    fn test_absent_fields_render_unavailable() {
        let empty = PredictionResponse::default();
        assert!(render_panel(VisualizationTab::Ecg, &empty, 0).contains(ECG_UNAVAILABLE));
        assert!(render_panel(VisualizationTab::Pcg, &empty, 0).contains(PCG_UNAVAILABLE));
        assert!(render_panel(VisualizationTab::Spectrogram, &empty, 0).contains(SPECTROGRAM_UNAVAILABLE));
    }

    #[test]
    fn test_panel_uses_chart_endpoint() {
        let result = PredictionResponse {
            pcg_waveform_data: Some(vec![0.1, 0.2]),
            ..Default::default()
        };
        assert!(render_panel(VisualizationTab::Pcg, &result, 42).contains("/charts/pcg.png?v=42"));
    }

    #[test]
    fn test_active_tab_marked() {
        let html = render_tabs(VisualizationTab::Pcg);
        assert!(html.contains(r#"action="/tab/pcg" class="inline-form"><button type="submit" class="tab active""#));
        assert_eq!(html.matches("tab active").count(), 1);
    }

    #[test]
    fn test_previous_result_note_after_reselection() {
        let mut view = view();
        view.select_ecg(UploadedFile::new("first.csv", b"1,2".to_vec()))
            .unwrap();
        view.begin_analysis().unwrap();
        view.complete_analysis(Ok(PredictionResponse {
            ecg_risk: Some(0.3),
            ..Default::default()
        }));
        assert!(!render_results(&view.snapshot()).contains(PREVIOUS_RESULT_NOTE));

        view.select_ecg(UploadedFile::new("second.csv", b"3,4".to_vec()))
            .unwrap();
        let snapshot = view.snapshot();
        assert_eq!(snapshot.phase, AnalysisPhase::ResultReady);
        assert!(render_results(&snapshot).contains(PREVIOUS_RESULT_NOTE));
    }

    #[test]
    fn test_csv_modal_pads_ragged_rows() {
        let mut view = view();
        view.select_ecg(UploadedFile::new("ecg.csv", b"a\nb,c".to_vec()))
            .unwrap();
        view.open_csv_preview().unwrap();

        let html = render_csv_modal(&view.snapshot());
        assert!(html.contains("<tr><td>a</td><td></td></tr>"));
        assert!(html.contains("2 rows"));

        view.close_csv_preview();
        assert!(render_csv_modal(&view.snapshot()).is_empty());
    }
}

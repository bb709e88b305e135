//! Backend response documents as the inference service emits them

use cardio_common::prediction::{FIELD_ECG_HEATMAP, FIELD_PCG_RISK};
use cardio_common::{PredictionResponse, RiskLevel};

#[test]
fn test_ecg_only_response() {
    let body = r#"{
        "ecg_risk": 0.734,
        "pcg_risk": null,
        "combined_risk": 0.734,
        "ecg_plot_data": [{"x": 0.0, "y": 0.12}, {"x": 0.004, "y": 0.15}, {"x": 0.008, "y": 0.11}],
        "ecg_heatmap": [0.1, 0.8, 0.3]
    }"#;

    let response: PredictionResponse = serde_json::from_str(body).unwrap();
    assert!(response.validate().is_empty());
    assert!(response.has_ecg_waveform());
    assert!(!response.has_pcg_waveform());
    assert!(!response.has_spectrogram());
    assert_eq!(RiskLevel::from_score(response.ecg_risk), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(response.pcg_risk), RiskLevel::Unavailable);
}

#[test]
fn test_bimodal_response_with_spectrogram() {
    let body = r#"{
        "ecg_risk": 0.2,
        "pcg_risk": 0.5,
        "combined_risk": 0.35,
        "ecg_plot_data": [[0.0, 1.0], [0.004, 0.9]],
        "pcg_waveform_data": [0.0, 0.25, -0.25, 0.0],
        "pcg_heatmap": [0.0, 0.5, 1.0, 0.5],
        "pcg_spectrogram": "data:image/png;base64,iVBORw0KGgo="
    }"#;

    let response: PredictionResponse = serde_json::from_str(body).unwrap();
    assert!(response.validate().is_empty());
    assert_eq!(RiskLevel::from_score(response.pcg_risk), RiskLevel::Low);
    assert_eq!(response.spectrogram_bytes().unwrap()[..4], [0x89, b'P', b'N', b'G']);
}

#[test]
fn test_sanitize_keeps_valid_fields() {
    let body = r#"{
        "ecg_risk": 0.6,
        "pcg_risk": -0.1,
        "ecg_plot_data": [{"x": 0, "y": 0}, {"x": 1, "y": 0}],
        "ecg_heatmap": [0.5]
    }"#;

    let response: PredictionResponse = serde_json::from_str(body).unwrap();
    let (clean, violations) = response.sanitized();

    let fields: Vec<_> = violations.iter().map(|v| v.field()).collect();
    assert_eq!(fields, vec![FIELD_PCG_RISK, FIELD_ECG_HEATMAP]);
    assert_eq!(clean.ecg_risk, Some(0.6));
    assert_eq!(clean.pcg_risk, None);
    assert!(clean.has_ecg_waveform());
    assert!(clean.ecg_heatmap.is_none());
}

#[test]
fn test_violations_serialize_with_kind() {
    let response = PredictionResponse {
        combined_risk: Some(2.0),
        ..Default::default()
    };
    let json = serde_json::to_value(response.validate()).unwrap();
    assert_eq!(json[0]["kind"], "risk_out_of_range");
    assert_eq!(json[0]["field"], "combined_risk");
}

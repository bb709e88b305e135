//! Chart rasterization
//!
//! Renders the waveform panels into RGB bitmaps. The same bitmaps back the
//! PNGs shown on the page and the images embedded in the PDF report.
//!
//! No text is drawn, which keeps plotters free of any font backend.

use cardio_common::PredictionResponse;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CHART_WIDTH: u32 = 1200;
pub const DEFAULT_CHART_HEIGHT: u32 = 360;

const ECG_LINE: RGBColor = RGBColor(37, 99, 235);
const PCG_LINE: RGBColor = RGBColor(124, 58, 237);
const HEAT: RGBColor = RGBColor(239, 68, 68);

/// Saliency below this is not drawn
const HEAT_FLOOR: f64 = 0.05;
/// Strongest overlay opacity
const HEAT_MAX_ALPHA: f64 = 0.55;

/// Charts that can be captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    EcgWaveform,
    PcgWaveform,
    Spectrogram,
}

impl ChartKind {
    /// Report order
    pub const ALL: [ChartKind; 3] = [
        ChartKind::EcgWaveform,
        ChartKind::PcgWaveform,
        ChartKind::Spectrogram,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::EcgWaveform => "ecg",
            ChartKind::PcgWaveform => "pcg",
            ChartKind::Spectrogram => "spectrogram",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::EcgWaveform => "ECG Waveform with Grad-CAM Heatmap",
            ChartKind::PcgWaveform => "PCG Waveform with Grad-CAM Heatmap",
            ChartKind::Spectrogram => "PCG Spectrogram",
        }
    }

    /// Whether `result` carries the data this chart needs
    pub fn is_available(&self, result: &PredictionResponse) -> bool {
        match self {
            ChartKind::EcgWaveform => result.has_ecg_waveform(),
            ChartKind::PcgWaveform => result.has_pcg_waveform(),
            ChartKind::Spectrogram => result.has_spectrogram(),
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_suffix(".png").unwrap_or(s);
        match s {
            "ecg" => Ok(ChartKind::EcgWaveform),
            "pcg" => Ok(ChartKind::PcgWaveform),
            "spectrogram" => Ok(ChartKind::Spectrogram),
            other => Err(format!("unknown chart: {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("No data for {}", .0.slug())]
    NoData(ChartKind),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Image decoding failed: {0}")]
    Decode(String),
}

/// Packed 8-bit RGB pixels, row-major, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, ChartError> {
        if rgb.len() != (width as usize) * (height as usize) * 3 || width == 0 || height == 0 {
            return Err(ChartError::Render(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                rgb.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, rgb })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    pub fn to_png(&self) -> Result<Vec<u8>, ChartError> {
        let buffer = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or_else(|| ChartError::Render("pixel buffer size mismatch".to_string()))?;
        let mut out = Vec::new();
        buffer
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| ChartError::Render(e.to_string()))?;
        Ok(out)
    }

    /// Decode PNG/JPEG bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, ChartError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| ChartError::Decode(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(width, height, rgb.into_raw())
    }
}

/// Snapshot of one on-screen chart region
pub trait ChartCapture: Send + Sync {
    fn capture(&self, kind: ChartKind, result: &PredictionResponse) -> Result<RasterImage, ChartError>;
}

/// plotters-backed capture
#[derive(Debug, Clone, Copy)]
pub struct PlottersCapture {
    width: u32,
    height: u32,
}

impl Default for PlottersCapture {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT)
    }
}

impl PlottersCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(16),
            height: height.max(16),
        }
    }
}

impl ChartCapture for PlottersCapture {
    fn capture(&self, kind: ChartKind, result: &PredictionResponse) -> Result<RasterImage, ChartError> {
        if !kind.is_available(result) {
            return Err(ChartError::NoData(kind));
        }

        match kind {
            ChartKind::EcgWaveform => {
                let points: Vec<(f64, f64)> = result
                    .ecg_plot_data
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|p| (p.x, p.y))
                    .collect();
                draw_waveform(&points, result.ecg_heatmap.as_deref(), ECG_LINE, self.width, self.height)
            }
            ChartKind::PcgWaveform => {
                let points: Vec<(f64, f64)> = result
                    .pcg_waveform_data
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64, *v))
                    .collect();
                draw_waveform(&points, result.pcg_heatmap.as_deref(), PCG_LINE, self.width, self.height)
            }
            ChartKind::Spectrogram => {
                let bytes = result
                    .spectrogram_bytes()
                    .map_err(|e| ChartError::Decode(e.to_string()))?;
                RasterImage::decode(&bytes)
            }
        }
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Non-degenerate (min, max) of `values`, padded by 5%
fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn draw_waveform(
    points: &[(f64, f64)],
    heatmap: Option<&[f64]>,
    line: RGBColor,
    width: u32,
    height: u32,
) -> Result<RasterImage, ChartError> {
    let (x_min, x_max) = axis_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = axis_range(points.iter().map(|p| p.1));

    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(render_err)?;

        // Heatmap bands sit under the trace; one band per sample, spanning
        // to the next sample's x
        if let Some(heat) = heatmap.filter(|h| h.len() == points.len()) {
            let step = if points.len() > 1 {
                (points[points.len() - 1].0 - points[0].0) / (points.len() - 1) as f64
            } else {
                1.0
            };
            let bands = points.iter().enumerate().filter_map(|(i, &(x, _))| {
                let saliency = heat[i].clamp(0.0, 1.0);
                if saliency < HEAT_FLOOR {
                    return None;
                }
                let x_end = points.get(i + 1).map(|p| p.0).unwrap_or(x + step);
                Some(Rectangle::new(
                    [(x, y_min), (x_end, y_max)],
                    HEAT.mix(saliency * HEAT_MAX_ALPHA).filled(),
                ))
            });
            chart.draw_series(bands).map_err(render_err)?;
        }

        chart
            .draw_series(LineSeries::new(points.iter().copied(), line.stroke_width(2)))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }

    RasterImage::new(width, height, buffer)
}

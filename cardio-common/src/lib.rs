//! # CardioSense Common Library
//!
//! Shared code for the CardioSense presentation services including:
//! - The prediction response contract and its validation
//! - Risk labeling
//! - UI event types (UiEvent enum) and the EventBus
//! - Configuration loading
//! - SSE and time utilities

pub mod config;
pub mod error;
pub mod events;
pub mod prediction;
pub mod risk;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use prediction::{ContractViolation, PlotPoint, PredictionResponse};
pub use risk::{RiskLevel, RISK_THRESHOLD};

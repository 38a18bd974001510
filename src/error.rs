//! Error types for Folio Analytics
//!
//! Only structural and contract violations are errors. Missing counters, zero
//! denominators and thin baselines surface as `None` in the computed values.

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Malformed heatmap: {0}")]
    MalformedHeatmap(String),

    #[error("Invalid baseline window: {0} days (must be positive)")]
    InvalidWindow(usize),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse counters: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

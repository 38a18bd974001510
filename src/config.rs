//! Engine configuration
//!
//! Loaded from JSON with per-field defaults; callers may override any field
//! after loading (the CLI applies its flags on top).

use serde::{Deserialize, Serialize};

use crate::baseline::DEFAULT_BASELINE_WINDOW;
use crate::error::AnalyticsError;

/// Default number of heatmap cells kept when encoding
pub const DEFAULT_HEATMAP_TOP_K: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    /// Baseline window for z-scores, in days
    #[serde(default = "default_baseline_window_days")]
    pub baseline_window_days: usize,
    /// Cells kept by the heatmap encoder
    #[serde(default = "default_heatmap_top_k")]
    pub heatmap_top_k: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            baseline_window_days: default_baseline_window_days(),
            heatmap_top_k: default_heatmap_top_k(),
        }
    }
}

fn default_baseline_window_days() -> usize {
    DEFAULT_BASELINE_WINDOW
}

fn default_heatmap_top_k() -> usize {
    DEFAULT_HEATMAP_TOP_K
}

impl AnalyticsConfig {
    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AnalyticsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.baseline_window_days == 0 {
            return Err(AnalyticsError::InvalidWindow(self.baseline_window_days));
        }
        if self.heatmap_top_k == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "heatmapTopK must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

//! Core types for the Folio Analytics engine
//!
//! This module defines the values that flow through the engine: the per-day
//! counters delivered by ingestion, and the derived metrics and z-scores
//! computed from them. Every numeric input is optional; `None` means "no data"
//! and is never read as zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::heatmap::SparseHeatmap;

/// Engagement sub-block of a day record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementCounters {
    /// Views from desktop devices
    pub desktop_views: Option<u64>,
    /// Views from mobile and tablet devices
    pub mobile_tablet_views: Option<u64>,
    /// Sum of per-view scroll scores
    pub scroll_score_sum: Option<f64>,
    /// Sum of per-view scroll time (deciseconds)
    pub scroll_time_sum_ds: Option<f64>,
    /// Sum of time-to-first-interaction samples (ms)
    pub ttfi_sum_ms: Option<f64>,
    /// Number of time-to-first-interaction samples
    pub ttfi_count: Option<u64>,
    /// Project card view time across all projects (deciseconds)
    pub project_view_time_total_ds: Option<f64>,
    /// Project card exposures across all projects
    pub project_exposures_total: Option<u64>,
}

/// Cumulative counters for one project on one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectCounters {
    /// Card view time (deciseconds)
    pub view_time_ds: Option<f64>,
    /// Times the project card was exposed
    pub exposures: Option<u64>,
    /// Code-link clicks
    pub code_views: Option<u64>,
    /// Live-demo clicks
    pub live_views: Option<u64>,
}

/// Aggregated counters for one portfolio on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounters {
    pub portfolio_id: String,
    /// Calendar day (YYYY-MM-DD)
    pub date: NaiveDate,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub quality_visits: Option<u64>,
    #[serde(default)]
    pub email_copies: Option<u64>,
    #[serde(default)]
    pub social_clicks: Option<u64>,
    /// Engagement sub-block; `None` when the client sent no engagement data
    #[serde(default)]
    pub engagement: Option<EngagementCounters>,
    /// Per-project counters keyed by project id
    #[serde(default)]
    pub projects: BTreeMap<String, Option<ProjectCounters>>,
    /// Top-K activity heatmap
    #[serde(default)]
    pub heatmap: Option<SparseHeatmap>,
}

impl DailyCounters {
    /// Create an empty record for a portfolio and day
    pub fn new(portfolio_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            portfolio_id: portfolio_id.into(),
            date,
            views: None,
            quality_visits: None,
            email_copies: None,
            social_clicks: None,
            engagement: None,
            projects: BTreeMap::new(),
            heatmap: None,
        }
    }
}

/// Ratios and averages derived from one day's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedDayMetrics {
    /// Desktop share of device-attributed views (0-1)
    pub desktop_pct: Option<f64>,
    /// Mobile/tablet share of device-attributed views (0-1)
    pub mobile_tablet_pct: Option<f64>,
    /// Mean scroll score per view
    pub engagement_avg: Option<f64>,
    /// Mean scroll time per view (ms)
    pub avg_scroll_time_ms: Option<f64>,
    /// Mean project card view time per exposure (ms)
    pub avg_card_view_time_ms: Option<f64>,
    /// Mean time-to-first-interaction (ms)
    pub ttfi_mean_ms: Option<f64>,
    /// Email copies per view
    pub email_conversion: Option<f64>,
    /// Quality visits per view
    pub quality_visit_rate: Option<f64>,
    /// Social link clicks per view
    pub social_ctr: Option<f64>,
}

impl DerivedDayMetrics {
    /// All nine fields unknown
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Ratios derived from one project's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDerivedMetrics {
    /// Mean card view time per exposure (ms)
    pub avg_view_time_ms: Option<f64>,
    /// Code-link clicks per exposure
    pub code_ctr: Option<f64>,
    /// Live-demo clicks per exposure
    pub live_ctr: Option<f64>,
}

/// Baseline-relative anomaly scores, each clamped to [-3, 3]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZScoreSet {
    pub visits: Option<f64>,
    pub engagement: Option<f64>,
    /// Log-scale and sign-inverted: faster first interaction scores higher
    pub ttfi: Option<f64>,
    pub quality_visit_rate: Option<f64>,
    pub social_ctr: Option<f64>,
}

impl ZScoreSet {
    /// All five scores unknown
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether at least one score resolved
    pub fn any_known(&self) -> bool {
        [
            self.visits,
            self.engagement,
            self.ttfi,
            self.quality_visit_rate,
            self.social_ctr,
        ]
        .iter()
        .any(Option::is_some)
    }
}

//! Daily report encoding
//!
//! This module assembles everything the engine knows about one portfolio day
//! into a single serializable report: derived metrics, per-project metrics,
//! baseline z-scores and the decoded heatmap sample.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::baseline::BaselineReport;
use crate::error::AnalyticsError;
use crate::facade::AnalyticsFacade;
use crate::heatmap::HeatmapCell;
use crate::types::{DailyCounters, DerivedDayMetrics, ProjectDerivedMetrics};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata stamped on every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Computed analytics for one portfolio day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub portfolio_id: String,
    pub date: NaiveDate,
    pub computed_at_utc: String,
    pub derived: DerivedDayMetrics,
    pub projects: BTreeMap<String, ProjectDerivedMetrics>,
    pub baseline: BaselineReport,
    /// Sampled heatmap cells; absent when the day carried no heatmap
    pub heatmap: Option<Vec<HeatmapCell>>,
}

/// Report encoder with a stable instance id
pub struct ReportEncoder {
    instance_id: String,
    facade: AnalyticsFacade,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self::with_instance_id(Uuid::new_v4().to_string())
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            facade: AnalyticsFacade::new(),
        }
    }

    /// Build the report for `current`, scored against `history`
    pub fn encode(
        &self,
        current: &DailyCounters,
        history: &[DailyCounters],
        window_days: usize,
    ) -> Result<DailyReport, AnalyticsError> {
        let baseline = self
            .facade
            .compute_baseline_report(current, history, window_days)?;
        let heatmap = current
            .heatmap
            .as_ref()
            .map(|heatmap| self.facade.decode_heatmap(heatmap))
            .transpose()?;

        Ok(DailyReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            portfolio_id: current.portfolio_id.clone(),
            date: current.date,
            computed_at_utc: Utc::now().to_rfc3339(),
            derived: self.facade.compute_derived(current),
            projects: self.facade.compute_projects_derived(current),
            baseline,
            heatmap,
        })
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        current: &DailyCounters,
        history: &[DailyCounters],
        window_days: usize,
    ) -> Result<String, AnalyticsError> {
        let report = self.encode(current, history, window_days)?;
        serde_json::to_string_pretty(&report).map_err(AnalyticsError::JsonError)
    }
}

//! JSON entry points
//!
//! This module provides the string-in/string-out API used by the FFI layer
//! and the CLI. Inputs follow the `portfolio.daily_counters.v1` record shape.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::encoder::ReportEncoder;
use crate::error::AnalyticsError;
use crate::facade::AnalyticsFacade;
use crate::heatmap::SparseHeatmap;
use crate::types::{DailyCounters, DerivedDayMetrics, ProjectDerivedMetrics};

/// Derived metrics for one day record, portfolio and projects together
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedDay {
    pub portfolio_id: String,
    pub date: chrono::NaiveDate,
    pub derived: DerivedDayMetrics,
    pub projects: BTreeMap<String, ProjectDerivedMetrics>,
}

impl DerivedDay {
    pub fn from_counters(facade: &AnalyticsFacade, counters: &DailyCounters) -> Self {
        Self {
            portfolio_id: counters.portfolio_id.clone(),
            date: counters.date,
            derived: facade.compute_derived(counters),
            projects: facade.compute_projects_derived(counters),
        }
    }
}

/// Compute derived metrics for a single day record.
///
/// # Example
/// ```ignore
/// let json = derived_metrics_json(r#"{"portfolioId":"pf-1","date":"2024-05-01","views":10}"#)?;
/// ```
pub fn derived_metrics_json(counters_json: &str) -> Result<String, AnalyticsError> {
    let counters: DailyCounters = serde_json::from_str(counters_json)?;
    let day = DerivedDay::from_counters(&AnalyticsFacade::new(), &counters);
    Ok(serde_json::to_string(&day)?)
}

/// Compute z-scores for `current_json` against a JSON array of history records
pub fn z_scores_json(
    current_json: &str,
    history_json: &str,
    window_days: usize,
) -> Result<String, AnalyticsError> {
    let current: DailyCounters = serde_json::from_str(current_json)?;
    let history: Vec<DailyCounters> = serde_json::from_str(history_json)?;
    let scores = AnalyticsFacade::new().compute_z_scores(&current, &history, window_days)?;
    Ok(serde_json::to_string(&scores)?)
}

/// Decode a sparse heatmap object into a JSON array of cells
pub fn decode_heatmap_json(heatmap_json: &str) -> Result<String, AnalyticsError> {
    let heatmap: SparseHeatmap = serde_json::from_str(heatmap_json)?;
    let cells = AnalyticsFacade::new().decode_heatmap(&heatmap)?;
    Ok(serde_json::to_string(&cells)?)
}

/// Build the full daily report for `current_json`
pub fn daily_report_json(
    current_json: &str,
    history_json: &str,
    window_days: usize,
) -> Result<String, AnalyticsError> {
    let current: DailyCounters = serde_json::from_str(current_json)?;
    let history: Vec<DailyCounters> = serde_json::from_str(history_json)?;
    ReportEncoder::new().encode_to_json(&current, &history, window_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str = r#"{
        "portfolioId": "pf-1",
        "date": "2024-05-05",
        "views": 100,
        "engagement": {
            "desktopViews": 80,
            "mobileTabletViews": 20,
            "scrollScoreSum": 4500,
            "scrollTimeSumDs": 180,
            "ttfiSumMs": 85000,
            "ttfiCount": 95,
            "projectViewTimeTotalDs": 920,
            "projectExposuresTotal": 310
        },
        "projects": { "alpha": { "viewTimeDs": 30, "exposures": 10, "codeViews": 2 } }
    }"#;

    const HISTORY: &str = r#"[
        { "portfolioId": "pf-1", "date": "2024-05-01", "views": 60 },
        { "portfolioId": "pf-1", "date": "2024-05-03", "views": 80 },
        { "portfolioId": "pf-1", "date": "2024-05-02", "views": 70 },
        { "portfolioId": "pf-1", "date": "2024-05-05", "views": 100 }
    ]"#;

    #[test]
    fn test_derived_metrics_json() {
        let json = derived_metrics_json(CURRENT).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["derived"]["desktopPct"], 0.8);
        assert_eq!(value["derived"]["engagementAvg"], 45.0);
        assert_eq!(value["projects"]["alpha"]["avgViewTimeMs"], 300.0);
        assert!(value["projects"]["alpha"]["liveCtr"].is_null());
    }

    #[test]
    fn test_z_scores_json() {
        let json = z_scores_json(CURRENT, HISTORY, 14).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        // baseline 60, 70, 80: mean 70, std 10 -> (100 - 70) / 10 = 3
        assert_eq!(value["visits"], 3.0);
        assert!(value["ttfi"].is_null());
    }

    #[test]
    fn test_z_scores_json_invalid_window() {
        let result = z_scores_json(CURRENT, HISTORY, 0);
        assert!(matches!(result, Err(AnalyticsError::InvalidWindow(0))));
    }

    #[test]
    fn test_decode_heatmap_json() {
        let json =
            decode_heatmap_json(r#"{"rows":137,"columns":64,"indices":[5401],"values":[2.5]}"#)
                .unwrap();
        assert_eq!(json, r#"[{"row":84,"column":25,"value":2.5}]"#);

        let err = decode_heatmap_json(r#"{"rows":0,"columns":64,"indices":[],"values":[]}"#);
        assert!(matches!(err, Err(AnalyticsError::MalformedHeatmap(_))));
    }

    #[test]
    fn test_daily_report_json() {
        let json = daily_report_json(CURRENT, HISTORY, 14).unwrap();
        assert!(json.contains("\"reportVersion\""));
        assert!(json.contains("\"baselineDays\": 3"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            derived_metrics_json("not json"),
            Err(AnalyticsError::JsonError(_))
        ));
    }
}

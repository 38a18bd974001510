//! Single call surface for report builders

use std::collections::BTreeMap;

use crate::baseline::{BaselineReport, BaselineZScoreCalculator};
use crate::error::AnalyticsError;
use crate::features::DerivedMetricsCalculator;
use crate::heatmap::{HeatmapCell, SparseHeatmap};
use crate::types::{
    DailyCounters, DerivedDayMetrics, ProjectCounters, ProjectDerivedMetrics, ZScoreSet,
};

/// Delegates to the calculators without adding logic of its own
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsFacade;

impl AnalyticsFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_derived(&self, counters: &DailyCounters) -> DerivedDayMetrics {
        DerivedMetricsCalculator::derive(counters)
    }

    pub fn compute_project_derived(
        &self,
        project_counters: Option<&ProjectCounters>,
    ) -> ProjectDerivedMetrics {
        DerivedMetricsCalculator::derive_project(project_counters)
    }

    pub fn compute_projects_derived(
        &self,
        counters: &DailyCounters,
    ) -> BTreeMap<String, ProjectDerivedMetrics> {
        DerivedMetricsCalculator::derive_projects(counters)
    }

    /// Fails only with `InvalidWindow` when `window_days` is zero
    pub fn compute_z_scores(
        &self,
        current: &DailyCounters,
        history: &[DailyCounters],
        window_days: usize,
    ) -> Result<ZScoreSet, AnalyticsError> {
        Ok(BaselineZScoreCalculator::new(window_days)?.compute(current, history))
    }

    pub fn compute_baseline_report(
        &self,
        current: &DailyCounters,
        history: &[DailyCounters],
        window_days: usize,
    ) -> Result<BaselineReport, AnalyticsError> {
        Ok(BaselineZScoreCalculator::new(window_days)?.report(current, history))
    }

    pub fn decode_heatmap(
        &self,
        heatmap: &SparseHeatmap,
    ) -> Result<Vec<HeatmapCell>, AnalyticsError> {
        heatmap.cells()
    }
}

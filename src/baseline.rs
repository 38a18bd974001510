//! Baseline z-scores
//!
//! This module scores how unusual a day is relative to the portfolio's own
//! recent history. Each metric is compared against a rolling window of
//! previous days, in standard-deviation units, and clamped for display.
//!
//! Thin or flat history is not an error: the affected score is simply unknown.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::features::DerivedMetricsCalculator;
use crate::numeric::{clamp, widen};
use crate::types::{DailyCounters, DerivedDayMetrics, ZScoreSet};

/// Default baseline window in days
pub const DEFAULT_BASELINE_WINDOW: usize = 14;

/// Display bound for every z-score
pub const Z_SCORE_LIMIT: f64 = 3.0;

/// Minimum number of baseline values for a meaningful spread
const MIN_BASELINE_SAMPLES: usize = 2;

/// Spread at or below this fraction of the mean magnitude counts as zero
const ZERO_SPREAD_TOLERANCE: f64 = 1e-12;

/// Metrics that receive a baseline z-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoredMetric {
    Visits,
    Engagement,
    Ttfi,
    QualityVisitRate,
    SocialCtr,
}

impl ScoredMetric {
    pub const ALL: [ScoredMetric; 5] = [
        ScoredMetric::Visits,
        ScoredMetric::Engagement,
        ScoredMetric::Ttfi,
        ScoredMetric::QualityVisitRate,
        ScoredMetric::SocialCtr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoredMetric::Visits => "visits",
            ScoredMetric::Engagement => "engagement",
            ScoredMetric::Ttfi => "ttfi",
            ScoredMetric::QualityVisitRate => "qualityVisitRate",
            ScoredMetric::SocialCtr => "socialCtr",
        }
    }

    /// Read the metric from a day, already mapped into the space it is scored in
    fn observe(self, counters: &DailyCounters, derived: &DerivedDayMetrics) -> Option<f64> {
        match self {
            ScoredMetric::Visits => widen(counters.views),
            ScoredMetric::Engagement => derived.engagement_avg,
            // TTFI is right-skewed; score it on a log scale. ln is undefined at 0.
            ScoredMetric::Ttfi => derived.ttfi_mean_ms.filter(|ms| *ms > 0.0).map(f64::ln),
            ScoredMetric::QualityVisitRate => derived.quality_visit_rate,
            ScoredMetric::SocialCtr => derived.social_ctr,
        }
    }

    /// Sign applied so that a higher score is always the better outcome
    fn orientation(self) -> f64 {
        match self {
            ScoredMetric::Ttfi => -1.0,
            _ => 1.0,
        }
    }
}

/// Baseline statistics for one metric, in the metric's scored space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBaseline {
    pub metric: ScoredMetric,
    /// Baseline days where this metric was known
    pub sample_count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std_dev: Option<f64>,
}

/// Z-scores together with the baseline they were measured against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineReport {
    pub scores: ZScoreSet,
    /// Baseline days kept after excluding the scored day and windowing
    pub baseline_days: usize,
    pub metrics: Vec<MetricBaseline>,
}

/// Rolling-window z-score calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineZScoreCalculator {
    window_days: usize,
}

impl Default for BaselineZScoreCalculator {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_BASELINE_WINDOW,
        }
    }
}

impl BaselineZScoreCalculator {
    /// Create a calculator over the most recent `window_days` baseline days
    pub fn new(window_days: usize) -> Result<Self, AnalyticsError> {
        if window_days == 0 {
            warn!(window_days, "rejecting non-positive baseline window");
            return Err(AnalyticsError::InvalidWindow(window_days));
        }
        Ok(Self { window_days })
    }

    pub fn window_days(&self) -> usize {
        self.window_days
    }

    /// Score `current` against `history`.
    ///
    /// `history` may be unsorted, have gaps, and include the scored day itself.
    pub fn compute(&self, current: &DailyCounters, history: &[DailyCounters]) -> ZScoreSet {
        self.report(current, history).scores
    }

    /// Score `current` and return the per-metric baseline statistics alongside
    pub fn report(&self, current: &DailyCounters, history: &[DailyCounters]) -> BaselineReport {
        let baseline = self.select_baseline(current, history);
        let derived_baseline: Vec<(&DailyCounters, DerivedDayMetrics)> = baseline
            .iter()
            .map(|day| (*day, DerivedMetricsCalculator::derive(day)))
            .collect();
        let derived_current = DerivedMetricsCalculator::derive(current);

        let mut scores = ZScoreSet::unknown();
        let mut metrics = Vec::with_capacity(ScoredMetric::ALL.len());
        let enough_days = baseline.len() >= MIN_BASELINE_SAMPLES;
        if !enough_days {
            debug!(
                portfolio_id = %current.portfolio_id,
                date = %current.date,
                baseline_days = baseline.len(),
                "insufficient baseline, all z-scores unknown"
            );
        }

        for metric in ScoredMetric::ALL {
            let values: Vec<f64> = derived_baseline
                .iter()
                .filter_map(|(day, derived)| metric.observe(day, derived))
                .collect();
            let (mean, std_dev) = sample_stats(&values);

            metrics.push(MetricBaseline {
                metric,
                sample_count: values.len(),
                mean,
                std_dev,
            });

            if !enough_days {
                continue;
            }
            let today = metric.observe(current, &derived_current);
            let score = score_metric(metric, today, mean, std_dev);
            if score.is_none() {
                debug!(
                    portfolio_id = %current.portfolio_id,
                    date = %current.date,
                    metric = metric.as_str(),
                    samples = values.len(),
                    "z-score unknown"
                );
            }
            set_score(&mut scores, metric, score);
        }

        BaselineReport {
            scores,
            baseline_days: baseline.len(),
            metrics,
        }
    }

    /// Most recent `window_days` records, excluding the scored day, newest first
    fn select_baseline<'a>(
        &self,
        current: &DailyCounters,
        history: &'a [DailyCounters],
    ) -> Vec<&'a DailyCounters> {
        let mut baseline: Vec<&DailyCounters> =
            history.iter().filter(|day| day.date != current.date).collect();
        baseline.sort_by(|a, b| b.date.cmp(&a.date));
        baseline.truncate(self.window_days);
        baseline
    }
}

/// Sample mean and sample standard deviation; `None` below two values
fn sample_stats(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < MIN_BASELINE_SAMPLES {
        return (Some(mean), None);
    }

    let sum_squared_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let std_dev = (sum_squared_diff / (n - 1.0)).sqrt();
    (Some(mean), std_dev.is_finite().then_some(std_dev))
}

fn score_metric(
    metric: ScoredMetric,
    today: Option<f64>,
    mean: Option<f64>,
    std_dev: Option<f64>,
) -> Option<f64> {
    let (today, mean, std_dev) = (today?, mean?, std_dev?);
    if std_dev <= ZERO_SPREAD_TOLERANCE * mean.abs().max(1.0) {
        return None;
    }

    let z = metric.orientation() * (today - mean) / std_dev;
    z.is_finite().then(|| clamp(z, -Z_SCORE_LIMIT, Z_SCORE_LIMIT))
}

fn set_score(scores: &mut ZScoreSet, metric: ScoredMetric, score: Option<f64>) {
    let slot = match metric {
        ScoredMetric::Visits => &mut scores.visits,
        ScoredMetric::Engagement => &mut scores.engagement,
        ScoredMetric::Ttfi => &mut scores.ttfi,
        ScoredMetric::QualityVisitRate => &mut scores.quality_visit_rate,
        ScoredMetric::SocialCtr => &mut scores.social_ctr,
    };
    *slot = score;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngagementCounters;
    use chrono::{Days, NaiveDate};
    use pretty_assertions::assert_eq;

    fn date(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    }

    fn make_day(offset: u64, views: u64, ttfi_mean_ms: f64) -> DailyCounters {
        DailyCounters {
            views: Some(views),
            quality_visits: Some(views / 2),
            social_clicks: Some(views / 10),
            engagement: Some(EngagementCounters {
                scroll_score_sum: Some(views as f64 * 40.0),
                ttfi_sum_ms: Some(ttfi_mean_ms * 10.0),
                ttfi_count: Some(10),
                ..Default::default()
            }),
            ..DailyCounters::new("pf-1", date(offset))
        }
    }

    #[test]
    fn test_window_must_be_positive() {
        assert!(matches!(
            BaselineZScoreCalculator::new(0),
            Err(AnalyticsError::InvalidWindow(0))
        ));
        assert_eq!(BaselineZScoreCalculator::new(7).unwrap().window_days(), 7);
    }

    #[test]
    fn test_single_baseline_day_all_unknown() {
        let calc = BaselineZScoreCalculator::default();
        let current = make_day(5, 200, 800.0);
        let history = vec![make_day(4, 100, 900.0)];

        assert_eq!(calc.compute(&current, &history), ZScoreSet::unknown());
    }

    #[test]
    fn test_current_day_excluded_from_baseline() {
        let calc = BaselineZScoreCalculator::default();
        let current = make_day(5, 200, 800.0);
        let history = vec![current.clone(), make_day(4, 100, 900.0)];

        let report = calc.report(&current, &history);
        assert_eq!(report.baseline_days, 1);
        assert_eq!(report.scores, ZScoreSet::unknown());
    }

    #[test]
    fn test_increasing_views_positive_visits_score() {
        let calc = BaselineZScoreCalculator::new(7).unwrap();
        let history = vec![
            make_day(3, 130, 900.0),
            make_day(0, 100, 950.0),
            make_day(2, 120, 850.0),
            make_day(1, 110, 1000.0),
        ];
        let current = make_day(4, 180, 700.0);

        let scores = calc.compute(&current, &history);
        let visits = scores.visits.unwrap();
        assert!(visits > 0.0);
        assert!(visits <= Z_SCORE_LIMIT);
        // mean 115, sample std ~12.91 -> z ~5.03, clamped
        assert_eq!(visits, 3.0);
    }

    #[test]
    fn test_visits_z_unclamped_value() {
        let calc = BaselineZScoreCalculator::default();
        let history = vec![make_day(0, 10, 500.0), make_day(1, 20, 500.0), make_day(2, 30, 500.0)];
        let current = make_day(3, 25, 500.0);

        let scores = calc.compute(&current, &history);
        // mean 20, sample std 10
        assert!((scores.visits.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_faster_ttfi_scores_higher() {
        let calc = BaselineZScoreCalculator::default();
        let history = vec![
            make_day(0, 100, 1000.0),
            make_day(1, 100, 1200.0),
            make_day(2, 100, 900.0),
            make_day(3, 100, 1100.0),
        ];

        let fast = calc.compute(&make_day(4, 100, 950.0), &history).ttfi.unwrap();
        let slow = calc.compute(&make_day(4, 100, 1150.0), &history).ttfi.unwrap();
        assert!(fast > 0.0);
        assert!(slow < 0.0);

        let logs: Vec<f64> = [1000.0f64, 1200.0, 900.0, 1100.0].iter().map(|v| v.ln()).collect();
        let (mean, std_dev) = sample_stats(&logs);
        let expected = -(950.0f64.ln() - mean.unwrap()) / std_dev.unwrap();
        assert!((fast - expected).abs() < 1e-9);
    }

    fn with_scroll_per_view(mut day: DailyCounters, per_view: f64) -> DailyCounters {
        let views = day.views.unwrap_or(0) as f64;
        if let Some(engagement) = day.engagement.as_mut() {
            engagement.scroll_score_sum = Some(views * per_view);
        }
        day
    }

    #[test]
    fn test_zero_ttfi_only_affects_ttfi() {
        let calc = BaselineZScoreCalculator::default();
        let history = vec![
            with_scroll_per_view(make_day(0, 100, 1000.0), 30.0),
            with_scroll_per_view(make_day(1, 120, 1200.0), 45.0),
            with_scroll_per_view(make_day(2, 90, 900.0), 60.0),
        ];
        let current = with_scroll_per_view(make_day(3, 110, 0.0), 50.0);

        let scores = calc.compute(&current, &history);
        assert_eq!(scores.ttfi, None);
        assert!(scores.visits.is_some());
        // engagement averages 30/45/60: mean 45, sample std 15
        assert!((scores.engagement.unwrap() - 5.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_history_is_unknown() {
        let calc = BaselineZScoreCalculator::default();
        let history: Vec<DailyCounters> = (0..5).map(|i| make_day(i, 100, 800.0)).collect();
        let current = make_day(6, 400, 300.0);

        let scores = calc.compute(&current, &history);
        assert_eq!(scores.visits, None);
        assert_eq!(scores.ttfi, None);
        assert_eq!(scores.engagement, None);
    }

    #[test]
    fn test_metrics_scored_independently() {
        let calc = BaselineZScoreCalculator::default();
        let mut history = vec![
            make_day(0, 100, 1000.0),
            make_day(1, 140, 1300.0),
            make_day(2, 80, 700.0),
        ];
        // Only one baseline day keeps a ttfi sample
        for day in history.iter_mut().skip(1) {
            if let Some(engagement) = day.engagement.as_mut() {
                engagement.ttfi_count = None;
            }
        }
        let current = make_day(3, 120, 900.0);

        let report = calc.report(&current, &history);
        assert_eq!(report.scores.ttfi, None);
        assert!(report.scores.visits.is_some());

        let ttfi = report
            .metrics
            .iter()
            .find(|m| m.metric == ScoredMetric::Ttfi)
            .unwrap();
        assert_eq!(ttfi.sample_count, 1);
        assert_eq!(ttfi.std_dev, None);
    }

    #[test]
    fn test_window_keeps_most_recent_days() {
        let calc = BaselineZScoreCalculator::new(3).unwrap();
        // Old days are wildly different; only days 7..=9 should count
        let mut history: Vec<DailyCounters> = (0..7).map(|i| make_day(i, 10_000, 800.0)).collect();
        history.push(make_day(9, 30, 800.0));
        history.push(make_day(7, 10, 800.0));
        history.push(make_day(8, 20, 800.0));
        let current = make_day(10, 25, 800.0);

        let report = calc.report(&current, &history);
        assert_eq!(report.baseline_days, 3);
        assert!((report.scores.visits.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_scores_clamped_low() {
        let calc = BaselineZScoreCalculator::default();
        let history = vec![
            make_day(0, 100, 800.0),
            make_day(1, 101, 800.0),
            make_day(2, 99, 800.0),
        ];
        let current = make_day(3, 1, 800.0);

        assert_eq!(calc.compute(&current, &history).visits, Some(-3.0));
    }

    #[test]
    fn test_sample_stats() {
        assert_eq!(sample_stats(&[]), (None, None));
        assert_eq!(sample_stats(&[4.0]), (Some(4.0), None));
        let (mean, std_dev) = sample_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean.unwrap() - 5.0).abs() < 1e-12);
        assert!((std_dev.unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }
}

//! Derived metric computation
//!
//! Maps one day's counters into rates and averages:
//! - Device mix percentages
//! - Scroll engagement and scroll time per view
//! - Project card view time and time-to-first-interaction means
//! - Email, quality-visit and social conversion rates
//!
//! Each output is projected from its own inputs, so a single missing counter
//! degrades exactly the fields that read it.

use std::collections::BTreeMap;

use crate::numeric::{safe_add, safe_divide, scale_time_unit, widen};
use crate::types::{
    DailyCounters, DerivedDayMetrics, EngagementCounters, ProjectCounters, ProjectDerivedMetrics,
};

/// Calculator for per-day derived metrics
pub struct DerivedMetricsCalculator;

impl DerivedMetricsCalculator {
    /// Derive portfolio-level metrics for one day
    pub fn derive(counters: &DailyCounters) -> DerivedDayMetrics {
        let Some(engagement) = counters.engagement.as_ref() else {
            return DerivedDayMetrics::unknown();
        };

        let views = widen(counters.views);
        let (desktop_pct, mobile_tablet_pct) = compute_device_mix(engagement);

        DerivedDayMetrics {
            desktop_pct,
            mobile_tablet_pct,
            engagement_avg: safe_divide(engagement.scroll_score_sum, views),
            avg_scroll_time_ms: safe_divide(scale_time_unit(engagement.scroll_time_sum_ds), views),
            avg_card_view_time_ms: safe_divide(
                scale_time_unit(engagement.project_view_time_total_ds),
                widen(engagement.project_exposures_total),
            ),
            ttfi_mean_ms: safe_divide(engagement.ttfi_sum_ms, widen(engagement.ttfi_count)),
            email_conversion: safe_divide(widen(counters.email_copies), views),
            quality_visit_rate: safe_divide(widen(counters.quality_visits), views),
            social_ctr: safe_divide(widen(counters.social_clicks), views),
        }
    }

    /// Derive metrics for a single project; a missing record is all-unknown
    pub fn derive_project(project: Option<&ProjectCounters>) -> ProjectDerivedMetrics {
        let Some(project) = project else {
            return ProjectDerivedMetrics::default();
        };

        let exposures = widen(project.exposures);
        ProjectDerivedMetrics {
            avg_view_time_ms: safe_divide(scale_time_unit(project.view_time_ds), exposures),
            code_ctr: safe_divide(widen(project.code_views), exposures),
            live_ctr: safe_divide(widen(project.live_views), exposures),
        }
    }

    /// Derive metrics for every project in a day record, keyed by project id
    pub fn derive_projects(counters: &DailyCounters) -> BTreeMap<String, ProjectDerivedMetrics> {
        counters
            .projects
            .iter()
            .map(|(id, project)| (id.clone(), Self::derive_project(project.as_ref())))
            .collect()
    }
}

/// Device shares over the sum of desktop and mobile/tablet views.
///
/// The denominator tolerates one unknown side; each share still needs its own
/// numerator.
fn compute_device_mix(engagement: &EngagementCounters) -> (Option<f64>, Option<f64>) {
    let desktop = widen(engagement.desktop_views);
    let mobile_tablet = widen(engagement.mobile_tablet_views);
    let total = Some(safe_add(desktop, mobile_tablet));

    (
        safe_divide(desktop, total),
        safe_divide(mobile_tablet, total),
    )
}

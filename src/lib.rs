//! Folio Analytics - compute engine for portfolio interaction telemetry
//!
//! Folio turns a portfolio's aggregated daily counters into values a report
//! can show: per-day ratios and averages, z-scores against the portfolio's own
//! recent history, and a compact top-K encoding of the interaction heatmap.
//!
//! Every computation is a pure function over caller-supplied values. Missing
//! counters are carried as `None` end to end and never read as zero.
//!
//! ## Modules
//!
//! - **Derived metrics**: device mix, engagement, conversion rates, project CTRs
//! - **Baselines**: rolling-window z-scores with a log scale for first-interaction time
//! - **Heatmaps**: sparse top-K grid sampling

pub mod baseline;
pub mod config;
pub mod encoder;
pub mod error;
pub mod facade;
pub mod features;
pub mod heatmap;
pub mod numeric;
pub mod pipeline;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use baseline::{BaselineReport, BaselineZScoreCalculator, ScoredMetric, Z_SCORE_LIMIT};
pub use config::AnalyticsConfig;
pub use encoder::{DailyReport, ReportEncoder};
pub use error::AnalyticsError;
pub use facade::AnalyticsFacade;
pub use features::DerivedMetricsCalculator;
pub use heatmap::{HeatmapCell, SparseHeatmap, SparseHeatmapCodec};
pub use pipeline::{daily_report_json, decode_heatmap_json, derived_metrics_json, z_scores_json};
pub use schema::{CountersAdapter, SCHEMA_VERSION};
pub use types::{
    DailyCounters, DerivedDayMetrics, EngagementCounters, ProjectCounters, ProjectDerivedMetrics,
    ZScoreSet,
};

/// Engine version embedded in all reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "folio-analytics";

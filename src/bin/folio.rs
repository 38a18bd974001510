//! Folio CLI - Command-line interface for Folio Analytics
//!
//! Commands:
//! - derive: Compute derived metrics for each day record
//! - zscore: Score one day against the other records of its portfolio
//! - report: Build full daily reports
//! - heatmap: Decode or encode sparse heatmaps
//! - schema: Print input schema information

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use folio_analytics::pipeline::DerivedDay;
use folio_analytics::{
    AnalyticsConfig, AnalyticsError, AnalyticsFacade, CountersAdapter, DailyCounters,
    HeatmapCell, ReportEncoder, SparseHeatmap, SparseHeatmapCodec, ENGINE_VERSION, SCHEMA_VERSION,
};

/// Folio - analytics engine for portfolio telemetry
#[derive(Parser)]
#[command(name = "folio")]
#[command(version = ENGINE_VERSION)]
#[command(
    about = "Compute derived metrics, z-scores and heatmaps from portfolio counters",
    long_about = None
)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "ndjson")]
    output_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute derived metrics for every day record
    Derive {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,
    },

    /// Score one day against the other records of its portfolio
    Zscore {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Day to score (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Portfolio to score; may be omitted when only one portfolio has the date
        #[arg(long)]
        portfolio_id: Option<String>,

        /// Baseline window in days (overrides config)
        #[arg(long)]
        window_days: Option<usize>,

        /// Include per-metric baseline statistics
        #[arg(long)]
        detailed: bool,
    },

    /// Build daily reports
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Day to report (YYYY-MM-DD); every day in the input when omitted
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Only report this portfolio
        #[arg(long)]
        portfolio_id: Option<String>,

        /// Baseline window in days (overrides config)
        #[arg(long)]
        window_days: Option<usize>,
    },

    /// Decode or encode sparse heatmaps
    Heatmap {
        #[command(subcommand)]
        action: HeatmapAction,
    },

    /// Print input schema information
    Schema,
}

#[derive(Subcommand)]
enum HeatmapAction {
    /// Expand a sparse heatmap object into cells
    Decode {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Keep the top-K cells of a JSON array of cells
    Encode {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        rows: u32,

        #[arg(long)]
        columns: u32,

        /// Cells to keep (overrides config)
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one day record per line)
    Ndjson,
    /// JSON array of day records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FolioCliError> {
    let config = load_config(cli.config.as_deref())?;
    let format = cli.output_format;

    match cli.command {
        Commands::Derive { input, input_format } => cmd_derive(&input, input_format, &format),

        Commands::Zscore {
            input,
            input_format,
            date,
            portfolio_id,
            window_days,
            detailed,
        } => cmd_zscore(
            &input,
            input_format,
            date,
            portfolio_id,
            window_days.unwrap_or(config.baseline_window_days),
            detailed,
            &format,
        ),

        Commands::Report {
            input,
            input_format,
            date,
            portfolio_id,
            window_days,
        } => cmd_report(
            &input,
            input_format,
            date,
            portfolio_id.as_deref(),
            window_days.unwrap_or(config.baseline_window_days),
            &format,
        ),

        Commands::Heatmap { action } => match action {
            HeatmapAction::Decode { input } => cmd_heatmap_decode(&input, &format),
            HeatmapAction::Encode {
                input,
                rows,
                columns,
                top_k,
            } => cmd_heatmap_encode(
                &input,
                rows,
                columns,
                top_k.unwrap_or(config.heatmap_top_k),
                &format,
            ),
        },

        Commands::Schema => cmd_schema(),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig, FolioCliError> {
    match path {
        Some(path) => {
            let config = AnalyticsConfig::from_json(&fs::read_to_string(path)?)?;
            debug!(path = %path.display(), ?config, "loaded config");
            Ok(config)
        }
        None => Ok(AnalyticsConfig::default()),
    }
}

fn cmd_derive(
    input: &Path,
    input_format: InputFormat,
    format: &OutputFormat,
) -> Result<(), FolioCliError> {
    let records = read_records(input, &input_format)?;
    let facade = AnalyticsFacade::new();

    let results: Vec<DerivedDay> = records
        .iter()
        .map(|counters| DerivedDay::from_counters(&facade, counters))
        .collect();

    print!("{}", format_output(&results, format)?);
    Ok(())
}

fn cmd_zscore(
    input: &Path,
    input_format: InputFormat,
    date: NaiveDate,
    portfolio_id: Option<String>,
    window_days: usize,
    detailed: bool,
    format: &OutputFormat,
) -> Result<(), FolioCliError> {
    let records = read_records(input, &input_format)?;
    let portfolio_id = match portfolio_id {
        Some(id) => id,
        None => single_portfolio_on(&records, date)?,
    };
    let current = CountersAdapter::find_day(&records, &portfolio_id, date)
        .ok_or_else(|| FolioCliError::NoSuchDay(portfolio_id.clone(), date))?;
    let history = CountersAdapter::portfolio_history(&records, &portfolio_id);
    let facade = AnalyticsFacade::new();

    let output = if detailed {
        let report = facade.compute_baseline_report(current, &history, window_days)?;
        format_output(&[report], format)?
    } else {
        let scores = facade.compute_z_scores(current, &history, window_days)?;
        format_output(&[scores], format)?
    };

    print!("{}", output);
    Ok(())
}

fn cmd_report(
    input: &Path,
    input_format: InputFormat,
    date: Option<NaiveDate>,
    portfolio_id: Option<&str>,
    window_days: usize,
    format: &OutputFormat,
) -> Result<(), FolioCliError> {
    let records = read_records(input, &input_format)?;
    let keys: Vec<(String, NaiveDate)> = CountersAdapter::day_keys(&records)
        .into_iter()
        .filter(|(id, day)| {
            portfolio_id.map_or(true, |wanted| id == wanted) && date.map_or(true, |d| *day == d)
        })
        .collect();
    if keys.is_empty() {
        return Err(match date {
            Some(date) => FolioCliError::NoSuchDay(portfolio_id.unwrap_or("*").to_string(), date),
            None => FolioCliError::NoRecords,
        });
    }

    let encoder = ReportEncoder::new();
    let mut reports = Vec::with_capacity(keys.len());
    let mut history: Vec<DailyCounters> = Vec::new();
    for (id, day) in &keys {
        if history.first().map_or(true, |first| first.portfolio_id != *id) {
            history = CountersAdapter::portfolio_history(&records, id);
        }
        let current = CountersAdapter::find_day(&history, id, *day)
            .ok_or_else(|| FolioCliError::NoSuchDay(id.clone(), *day))?;
        reports.push(encoder.encode(current, &history, window_days)?);
    }
    info!(reports = reports.len(), window_days, "built daily reports");

    print!("{}", format_output(&reports, format)?);
    Ok(())
}

fn cmd_heatmap_decode(input: &Path, format: &OutputFormat) -> Result<(), FolioCliError> {
    let heatmap: SparseHeatmap = serde_json::from_str(&read_input(input)?)?;
    let cells = heatmap.cells()?;
    print!("{}", format_output(&cells, format)?);
    Ok(())
}

fn cmd_heatmap_encode(
    input: &Path,
    rows: u32,
    columns: u32,
    top_k: usize,
    format: &OutputFormat,
) -> Result<(), FolioCliError> {
    let cells: Vec<HeatmapCell> = serde_json::from_str(&read_input(input)?)?;
    let heatmap = SparseHeatmapCodec::encode(&cells, rows, columns, top_k)?;
    debug!(input_cells = cells.len(), kept = heatmap.len(), "encoded heatmap");
    print!("{}", format_output(&[heatmap], format)?);
    Ok(())
}

fn cmd_schema() -> Result<(), FolioCliError> {
    println!("Input Schema: {}", SCHEMA_VERSION);
    println!();
    println!("One record per portfolio per calendar day. Every counter is optional;");
    println!("a missing counter means no data and is never read as zero.");
    println!();
    println!("- portfolioId, date (YYYY-MM-DD)");
    println!("- views, qualityVisits, emailCopies, socialClicks");
    println!("- engagement: {{ desktopViews, mobileTabletViews, scrollScoreSum,");
    println!("    scrollTimeSumDs, ttfiSumMs, ttfiCount, projectViewTimeTotalDs,");
    println!("    projectExposuresTotal }}");
    println!("- projects: {{ <projectId>: {{ viewTimeDs, exposures, codeViews,");
    println!("    liveViews }} | null }}");
    println!("- heatmap: {{ rows, columns, indices[], values[], counts[]? }}");
    println!();
    println!("Times ending in Ds are deciseconds; Ms are milliseconds.");
    Ok(())
}

// Helper functions

/// The only portfolio with a record on `date`, for calls without `--portfolio-id`
fn single_portfolio_on(
    records: &[DailyCounters],
    date: NaiveDate,
) -> Result<String, FolioCliError> {
    let mut ids: Vec<String> = CountersAdapter::day_keys(records)
        .into_iter()
        .filter(|(_, day)| *day == date)
        .map(|(id, _)| id)
        .collect();
    match ids.len() {
        0 => Err(FolioCliError::NoSuchDay("*".to_string(), date)),
        1 => Ok(ids.remove(0)),
        _ => Err(FolioCliError::AmbiguousPortfolio(date, ids)),
    }
}

fn read_input(input: &Path) -> Result<String, FolioCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<DailyCounters>, FolioCliError> {
    let data = read_input(input)?;
    let records = match input_format {
        InputFormat::Ndjson => CountersAdapter::parse_ndjson(&data)?,
        InputFormat::Json => CountersAdapter::parse_array(&data)?,
    };

    if records.is_empty() {
        return Err(FolioCliError::NoRecords);
    }
    Ok(records)
}

fn format_output<T: Serialize>(
    items: &[T],
    format: &OutputFormat,
) -> Result<String, FolioCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for item in items {
                lines.push(serde_json::to_string(item)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(items)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(items)?),
    }
}

// Error types

#[derive(Debug)]
enum FolioCliError {
    Io(io::Error),
    Analytics(AnalyticsError),
    Json(serde_json::Error),
    NoRecords,
    NoSuchDay(String, NaiveDate),
    AmbiguousPortfolio(NaiveDate, Vec<String>),
}

impl From<io::Error> for FolioCliError {
    fn from(e: io::Error) -> Self {
        FolioCliError::Io(e)
    }
}

impl From<AnalyticsError> for FolioCliError {
    fn from(e: AnalyticsError) -> Self {
        FolioCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for FolioCliError {
    fn from(e: serde_json::Error) -> Self {
        FolioCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FolioCliError> for CliError {
    fn from(e: FolioCliError) -> Self {
        match e {
            FolioCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FolioCliError::Analytics(e) => {
                let (code, hint) = match &e {
                    AnalyticsError::MalformedHeatmap(_) => (
                        "MALFORMED_HEATMAP",
                        "Check grid dimensions and that indices, values and counts line up",
                    ),
                    AnalyticsError::InvalidWindow(_) => {
                        ("INVALID_WINDOW", "Pass a positive --window-days")
                    }
                    AnalyticsError::JsonError(_) | AnalyticsError::ParseError(_) => {
                        ("PARSE_ERROR", "Ensure input matches the schema printed by 'folio schema'")
                    }
                    AnalyticsError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Review the configuration file")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FolioCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FolioCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No day records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            FolioCliError::NoSuchDay(portfolio_id, date) => CliError {
                code: "NO_SUCH_DAY".to_string(),
                message: format!("No record for portfolio {} on {}", portfolio_id, date),
                hint: Some("Pick a portfolio and date present in the input".to_string()),
            },
            FolioCliError::AmbiguousPortfolio(date, ids) => CliError {
                code: "AMBIGUOUS_PORTFOLIO".to_string(),
                message: format!("{} portfolios have a record on {}", ids.len(), date),
                hint: Some(format!("Pass --portfolio-id, one of: {}", ids.join(", "))),
            },
        }
    }
}

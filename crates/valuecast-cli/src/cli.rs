//! CLI argument definitions for valuecast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Search the SEC ticker index |
//! | `facts` | Fetch and normalize company facts |
//! | `forecast` | Forecast statements from SEC facts, a CSV upload or sample data |
//! | `value` | Full pipeline: forecast, UFCF, DCF, comps, sensitivity, advisory |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as failures |
//! | `--cache-dir` | `.cache` | Response cache directory |
//! | `--refresh` | `false` | Refetch and overwrite cached responses |
//! | `--offline` | `false` | Serve from cache only |
//!
//! # Examples
//!
//! ```bash
//! valuecast search APP --limit 5
//! valuecast facts AAPL --years 4 --pretty
//! valuecast forecast --sample --forecast-years 5
//! valuecast value --ticker AAPL --wacc 0.09 --report out/aapl.xlsx
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use valuecast_core::{SensitivityMetric, TerminalMethod};

/// Driver-based forecasting and valuation from SEC company facts.
#[derive(Debug, Parser)]
#[command(name = "valuecast", author, version, about = "Forecasting and valuation CLI")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Response cache directory (overrides VALUECAST_CACHE_DIR).
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Refetch and overwrite cached responses.
    #[arg(long, global = true, default_value_t = false, conflicts_with = "offline")]
    pub refresh: bool,

    /// Never touch the network; cache misses fail.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the SEC ticker index by ticker substring.
    ///
    ///   valuecast search APP
    Search(SearchArgs),

    /// Fetch company facts and map them to canonical statement rows.
    ///
    ///   valuecast facts AAPL --years 4
    Facts(FactsArgs),

    /// Forecast the three statements and reconcile the balance sheet.
    ///
    ///   valuecast forecast --ticker AAPL
    ///   valuecast forecast --upload historicals.csv --growth 0.06
    Forecast(ForecastArgs),

    /// Run the full valuation pipeline.
    ///
    ///   valuecast value --sample --report out/sample.xlsx
    Value(ValueArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Ticker fragment, case-insensitive.
    pub query: String,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct FactsArgs {
    pub ticker: String,

    /// Most recent fiscal years to keep.
    #[arg(long, default_value_t = 5)]
    pub years: usize,
}

/// Where historical statements come from. Exactly one must be given.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Load SEC company facts for this ticker.
    #[arg(long)]
    pub ticker: Option<String>,

    /// CSV with columns statement,line_item,year,value.
    #[arg(long)]
    pub upload: Option<PathBuf>,

    /// Use generated sample statements.
    #[arg(long)]
    pub sample: bool,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Historical fiscal years to keep from SEC facts.
    #[arg(long, default_value_t = 5)]
    pub history_years: usize,

    /// Number of forecast years after the last historical year.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=30))]
    pub forecast_years: u16,

    /// Flat revenue growth; defaults to the advisory recommendation.
    #[arg(long, allow_hyphen_values = true)]
    pub growth: Option<f64>,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

/// Company profile feeding the advisory rules.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long, default_value = "")]
    pub sector: String,

    #[arg(long, default_value = "")]
    pub business_model: String,

    #[arg(long, default_value = "")]
    pub size: String,

    /// e.g. "High growth", "Mature", "Cyclical".
    #[arg(long, default_value = "")]
    pub stage: String,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Debug, Args)]
pub struct ValueArgs {
    #[command(flatten)]
    pub forecast: ForecastArgs,

    #[arg(long, default_value_t = 0.21)]
    pub tax_rate: f64,

    #[arg(long, default_value_t = 0.10)]
    pub wacc: f64,

    #[arg(long, value_enum, default_value_t = TerminalArg::ExitMultiple)]
    pub terminal_method: TerminalArg,

    /// Exit multiple applied to terminal EBITDA.
    #[arg(long, default_value_t = 12.0)]
    pub exit_multiple: f64,

    /// Perpetuity growth rate for the Gordon terminal value.
    #[arg(long, default_value_t = 0.02, allow_hyphen_values = true)]
    pub terminal_growth: f64,

    #[arg(long, default_value_t = 0.0)]
    pub debt: f64,

    #[arg(long, default_value_t = 0.0)]
    pub cash: f64,

    #[arg(long, default_value_t = 1.0)]
    pub shares: f64,

    /// Peer multiple as NAME=MULTIPLE; repeatable.
    #[arg(long = "peer", value_parser = parse_peer)]
    pub peers: Vec<(String, f64)>,

    #[arg(long, default_value_t = 7)]
    pub grid_size: usize,

    #[arg(long, value_enum, default_value_t = MetricArg::SharePrice)]
    pub metric: MetricArg,

    /// Ask the configured text model to refine the recommendations.
    #[arg(long, default_value_t = false)]
    pub enhance: bool,

    /// Write the report to this path: a workbook file, or a directory for csv.
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Xlsx)]
    pub report_format: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TerminalArg {
    ExitMultiple,
    Perpetuity,
}

impl From<TerminalArg> for TerminalMethod {
    fn from(value: TerminalArg) -> Self {
        match value {
            TerminalArg::ExitMultiple => Self::ExitMultiple,
            TerminalArg::Perpetuity => Self::Perpetuity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    EnterpriseValue,
    EquityValue,
    SharePrice,
    PvUfcf,
    PvTerminal,
}

impl From<MetricArg> for SensitivityMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::EnterpriseValue => Self::EnterpriseValue,
            MetricArg::EquityValue => Self::EquityValue,
            MetricArg::SharePrice => Self::SharePrice,
            MetricArg::PvUfcf => Self::PvUfcf,
            MetricArg::PvTerminal => Self::PvTerminal,
        }
    }
}

fn parse_peer(raw: &str) -> Result<(String, f64), String> {
    let (name, multiple) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=MULTIPLE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(String::from("peer name must not be empty"));
    }
    let multiple = multiple
        .trim()
        .parse::<f64>()
        .map_err(|error| format!("invalid multiple for {name}: {error}"))?;
    Ok((name.to_owned(), multiple))
}

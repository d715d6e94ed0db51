//! Command-line parsing for the excess mortality tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the aggregation/forecasting code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{DEFAULT_LOOKBACK_YEARS, DEFAULT_OUTLIER_SLACK};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mortality", version, about = "Excess mortality from weekly death counts")]
pub struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Weekly deaths vs expected deaths, with totals, plot and optional exports.
    Excess(ExcessArgs),
    /// Actual deaths per year up to a given week.
    Yearly(YearlyArgs),
    /// List regions available in the data.
    Regions(DataArgs),
    /// List age band codes, labels and group names.
    Ages,
    /// List years available in the data.
    Years(YearsArgs),
    /// Total excess for many regions, age groups and lookbacks in parallel.
    Sweep(SweepArgs),
    /// Write a synthetic raw dataset to a directory.
    Demo(DemoArgs),
}

/// Where the raw data comes from. Unset paths fall back to the environment.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// Directory holding `mortality.csv` and `population.csv`.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Snapshot cache directory.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory that timed-out snapshots are moved to.
    #[arg(long, value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Age after which a cached snapshot is refetched.
    #[arg(long, value_name = "HOURS")]
    pub cache_timeout_hours: Option<f64>,

    /// Read the raw files directly, bypassing the snapshot cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Use a generated in-memory dataset instead of files.
    #[arg(long)]
    pub synthetic: bool,

    /// Seed for `--synthetic`.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}

/// Region and age selection.
#[derive(Debug, Args, Clone)]
pub struct SelectionArgs {
    /// Region code (e.g. SE, DE, AT).
    #[arg(short = 'r', long)]
    pub region: String,

    /// Age band codes, labels or groups (all, under65, 65plus), comma separated.
    #[arg(short = 'a', long, value_delimiter = ',', default_values = ["all"])]
    pub ages: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ExcessArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// First year to report (earlier years still feed the forecast).
    #[arg(long)]
    pub year: Option<i32>,

    /// Years of history behind each forecast.
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_YEARS)]
    pub lookback: usize,

    /// Absolute slack around the one-sigma outlier band.
    #[arg(long, default_value_t = DEFAULT_OUTLIER_SLACK)]
    pub slack: f64,

    /// Work on deaths per million inhabitants instead of absolute deaths.
    #[arg(long, alias = "per-million")]
    pub rate: bool,

    /// Leave weeks that cannot be forecast empty instead of failing.
    #[arg(long)]
    pub allow_gaps: bool,

    /// Print the week-by-week table.
    #[arg(long)]
    pub weeks: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the chart payload (weekly_data) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export per-week results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct YearlyArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Count weeks up to and including this one (default: latest week in the data).
    #[arg(long)]
    pub max_week: Option<u32>,

    /// Plot width (columns) for the bar chart.
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Export the yearly totals to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct YearsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only years with data for this region.
    #[arg(short = 'r', long)]
    pub region: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Regions to include (default: every region in the data).
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Age groups or band codes; each entry is one selection.
    #[arg(long, value_delimiter = ',', default_values = ["all", "under65", "65plus"])]
    pub groups: Vec<String>,

    /// Lookback years to compare.
    #[arg(long, value_delimiter = ',', default_values_t = [3usize, 5, 7])]
    pub lookbacks: Vec<usize>,

    /// First year counted in the totals.
    #[arg(long)]
    pub year: Option<i32>,

    /// Absolute slack around the one-sigma outlier band.
    #[arg(long, default_value_t = DEFAULT_OUTLIER_SLACK)]
    pub slack: f64,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Output directory (default: the configured data directory).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Region codes to generate.
    #[arg(long, value_delimiter = ',', default_values = ["AA", "BB"])]
    pub regions: Vec<String>,

    #[arg(long, default_value_t = 2013)]
    pub first_year: i32,

    #[arg(long, default_value_t = 2022)]
    pub last_year: i32,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Year with an extra spring wave of deaths.
    #[arg(long, default_value_t = 2020)]
    pub wave_year: i32,

    /// Generate without the extra wave.
    #[arg(long)]
    pub no_wave: bool,
}

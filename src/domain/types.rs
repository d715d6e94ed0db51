//! Run configuration types.
//!
//! `ForecastConfig` parameterises the forecaster; `ExcessConfig` is a full
//! `mortality excess` run as understood by the pipeline (derived from CLI flags
//! plus defaults).

use std::path::PathBuf;

use crate::domain::Region;

/// Years of history looked at for each forecast.
pub const DEFAULT_LOOKBACK_YEARS: usize = 5;

/// Absolute slack added on both sides of the one-sigma outlier band.
///
/// Weekly death counts are small integers for narrow selections, where one
/// standard deviation alone rejects too much. The value is in the same units
/// as the series being forecast.
pub const DEFAULT_OUTLIER_SLACK: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    pub lookback_years: usize,
    pub outlier_slack: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            outlier_slack: DEFAULT_OUTLIER_SLACK,
        }
    }
}

/// Which quantity the excess is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Absolute weekly deaths.
    Deaths,
    /// Weekly deaths per million inhabitants of the selected age bands.
    PerMillion,
}

impl Measure {
    pub fn unit_label(self) -> &'static str {
        match self {
            Measure::Deaths => "deaths",
            Measure::PerMillion => "deaths/million",
        }
    }

    /// Decimals kept when values are rounded for display.
    pub fn display_decimals(self) -> u32 {
        match self {
            Measure::Deaths => 0,
            Measure::PerMillion => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExcessConfig {
    pub region: Region,
    pub ages: Vec<String>,
    /// First calendar year shown; earlier weeks are still used as history.
    pub from_year: Option<i32>,
    pub measure: Measure,
    pub forecast: ForecastConfig,

    /// Forecast failures become gaps instead of aborting the run.
    pub allow_gaps: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

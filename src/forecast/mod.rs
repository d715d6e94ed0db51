//! Expected-deaths forecasting.
//!
//! A forecast for week `P` combines two pieces computed from the history
//! strictly before `P`:
//!
//! - a robust baseline: the outlier-trimmed mean of `P - 52`, `P - 104`, ...
//!   (`baseline`)
//! - a growth ratio: a straight line fitted through the yearly totals of the
//!   lookback years, evaluated at `P`'s year relative to the earliest year
//!   (`trend`)
//!
//! `forecast = baseline * growth_ratio`
//!
//! The first `lookback_years * 52` weeks of a series have too little history
//! and are passed through as-is.
//!
//! Everything here is a pure function of the input series: no I/O, no
//! randomness, no shared state.

use crate::domain::{ForecastConfig, GappedSeries, WEEKS_PER_YEAR, Week, WeeklySeries};
use crate::error::MortalityError;

pub mod baseline;
pub mod trend;

pub use baseline::{anchor_weeks, robust_mean};
pub use trend::{YearlyTotal, growth_ratio, yearly_totals};

/// A single forecast with its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub week: Week,
    pub baseline: f64,
    pub growth_ratio: f64,
    pub value: f64,
    /// Prior-year weeks that fed the baseline (before outlier trimming).
    pub baseline_points: usize,
    /// Yearly totals that fed the trend fit.
    pub trend_points: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    /// Fails when fewer than two lookback years are configured, since the
    /// baseline's standard deviation needs two values.
    pub fn new(config: ForecastConfig) -> Result<Self, MortalityError> {
        if config.lookback_years < 2 {
            return Err(MortalityError::insufficient_history(
                format!("a lookback of {} year(s)", config.lookback_years),
                "at least 2 lookback years are required",
            ));
        }
        if !(config.outlier_slack.is_finite() && config.outlier_slack >= 0.0) {
            return Err(MortalityError::insufficient_history(
                format!("an outlier slack of {}", config.outlier_slack),
                "slack must be finite and non-negative",
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> ForecastConfig {
        self.config
    }

    /// Number of leading weeks passed through unchanged.
    pub fn bootstrap_len(&self) -> usize {
        self.config.lookback_years * WEEKS_PER_YEAR as usize
    }

    /// Forecast a single week from the history in `series`.
    ///
    /// `week` does not have to be part of the series, which allows projecting
    /// past its end.
    pub fn forecast_point(&self, series: &WeeklySeries, week: Week) -> Result<Forecast, MortalityError> {
        let anchors = anchor_weeks(week, self.config.lookback_years);

        let (baseline, baseline_points) = baseline::baseline(series, week, &anchors, self.config.outlier_slack)?;

        let totals = yearly_totals(series, &anchors);
        let growth_ratio = growth_ratio(&totals, week)?;

        Ok(Forecast {
            week,
            baseline,
            growth_ratio,
            value: baseline * growth_ratio,
            baseline_points,
            trend_points: totals.len(),
        })
    }

    /// Expected values for every week of `series`.
    ///
    /// The bootstrap weeks are copied; the first failing forecast aborts.
    pub fn expected_deaths(&self, series: &WeeklySeries) -> Result<WeeklySeries, MortalityError> {
        let skip = self.bootstrap_len();
        series
            .iter()
            .enumerate()
            .map(|(i, (week, actual))| {
                if i < skip {
                    Ok((week, actual))
                } else {
                    self.forecast_point(series, week).map(|f| (week, f.value))
                }
            })
            .collect()
    }

    /// Like `expected_deaths`, but a failing forecast leaves a gap instead.
    pub fn expected_with_gaps(&self, series: &WeeklySeries) -> GappedSeries {
        let skip = self.bootstrap_len();
        series
            .iter()
            .enumerate()
            .map(|(i, (week, actual))| {
                if i < skip {
                    return (week, Some(actual));
                }
                match self.forecast_point(series, week) {
                    Ok(f) => (week, Some(f.value)),
                    Err(err) => {
                        log::warn!("{err}");
                        (week, None)
                    }
                }
            })
            .collect()
    }
}

/// Expected values with the default outlier slack.
pub fn expected_deaths(series: &WeeklySeries, lookback_years: usize) -> Result<WeeklySeries, MortalityError> {
    let config = ForecastConfig {
        lookback_years,
        ..ForecastConfig::default()
    };
    Forecaster::new(config)?.expected_deaths(series)
}

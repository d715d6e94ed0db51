//! Reporting: excess over expectation, yearly totals and chart payloads.
//!
//! We keep this separate from formatting so:
//! - the numbers can be tested without string comparisons
//! - exports and terminal output share one source of truth

use serde::Serialize;

use crate::domain::{AgeBand, GappedSeries, Measure, Region, Week, WeeklySeries, YearlySeries};

pub mod format;

pub use format::*;

/// One week of actual vs expected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcessPoint {
    pub week: Week,
    pub actual: f64,
    /// `None` where the forecast could not be made.
    pub expected: Option<f64>,
}

impl ExcessPoint {
    /// `actual - expected`.
    pub fn excess(&self) -> Option<f64> {
        self.expected.map(|e| self.actual - e)
    }

    /// Magnitude of positive excess, `0` otherwise.
    pub fn above(&self) -> f64 {
        self.excess().filter(|e| *e > 0.0).unwrap_or(0.0)
    }

    /// Magnitude of negative excess, `0` otherwise.
    pub fn below(&self) -> f64 {
        self.excess().filter(|e| *e <= 0.0).map(f64::abs).unwrap_or(0.0)
    }
}

/// Excess for one region and age selection.
#[derive(Debug, Clone)]
pub struct ExcessReport {
    pub region: Region,
    pub ages: Vec<AgeBand>,
    pub measure: Measure,
    pub lookback_years: usize,
    pub from_year: Option<i32>,
    pub points: Vec<ExcessPoint>,
}

impl ExcessReport {
    /// Sum of `actual - expected` over weeks that have a forecast.
    pub fn total_excess(&self) -> f64 {
        self.points.iter().filter_map(ExcessPoint::excess).sum()
    }

    pub fn total_above(&self) -> f64 {
        self.points.iter().map(ExcessPoint::above).sum()
    }

    pub fn total_below(&self) -> f64 {
        self.points.iter().map(ExcessPoint::below).sum()
    }

    pub fn gap_count(&self) -> usize {
        self.points.iter().filter(|p| p.expected.is_none()).count()
    }

    /// Week with the largest positive excess.
    pub fn peak(&self) -> Option<&ExcessPoint> {
        self.points
            .iter()
            .filter(|p| p.above() > 0.0)
            .max_by(|a, b| a.above().partial_cmp(&b.above()).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// One line of a sweep over regions, age groups and lookbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub region: Region,
    pub ages: String,
    pub lookback_years: usize,
    pub total_excess: f64,
    pub total_above: f64,
    pub total_below: f64,
    pub gaps: usize,
}

impl SweepRow {
    pub fn from_report(report: &ExcessReport, ages: impl Into<String>) -> Self {
        Self {
            region: report.region.clone(),
            ages: ages.into(),
            lookback_years: report.lookback_years,
            total_excess: report.total_excess(),
            total_above: report.total_above(),
            total_below: report.total_below(),
            gaps: report.gap_count(),
        }
    }
}

/// Pair every actual week with its expected value.
pub fn compute_excess(actual: &WeeklySeries, expected: &GappedSeries) -> Vec<ExcessPoint> {
    actual
        .iter()
        .map(|(week, a)| ExcessPoint {
            week,
            actual: a,
            expected: expected.get(week).flatten(),
        })
        .collect()
}

/// Actual totals per calendar year, counting only weeks `<= max_week`.
///
/// Capping the week makes a partial current year comparable to earlier years.
pub fn yearly_deaths(series: &WeeklySeries, max_week: u32) -> YearlySeries {
    let mut totals = std::collections::BTreeMap::new();
    for (week, value) in series.iter() {
        if week.week() <= max_week {
            *totals.entry(week.year()).or_insert(0.0) += value;
        }
    }
    YearlySeries::from(totals)
}

/// Chart-ready weekly payload (rounded for display).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyChart {
    pub deaths: Vec<f64>,
    pub label: Vec<String>,
    pub excess_deaths: Vec<Option<f64>>,
    pub expected_deaths: Vec<Option<f64>>,
    pub above_expectation_deaths: Vec<f64>,
    pub below_expectation_deaths: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyChartFile {
    pub region: Region,
    pub ages: Vec<AgeBand>,
    pub unit: &'static str,
    pub lookback_years: usize,
    pub weekly_data: WeeklyChart,
}

impl WeeklyChart {
    pub fn from_report(report: &ExcessReport) -> Self {
        let decimals = report.measure.display_decimals();
        let r = |v: f64| round_to(v, decimals);
        Self {
            deaths: report.points.iter().map(|p| r(p.actual)).collect(),
            label: report.points.iter().map(|p| p.week.label()).collect(),
            excess_deaths: report.points.iter().map(|p| p.excess().map(r)).collect(),
            expected_deaths: report.points.iter().map(|p| p.expected.map(r)).collect(),
            above_expectation_deaths: report.points.iter().map(|p| r(p.above())).collect(),
            below_expectation_deaths: report.points.iter().map(|p| r(p.below())).collect(),
        }
    }
}

impl WeeklyChartFile {
    pub fn from_report(report: &ExcessReport) -> Self {
        Self {
            region: report.region.clone(),
            ages: report.ages.clone(),
            unit: report.measure.unit_label(),
            lookback_years: report.lookback_years,
            weekly_data: WeeklyChart::from_report(report),
        }
    }
}

/// Chart-ready yearly payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyChart {
    pub years: Vec<i32>,
    pub actual_deaths: Vec<f64>,
    pub max_week: u32,
}

impl YearlyChart {
    pub fn new(totals: &YearlySeries, max_week: u32) -> Self {
        Self {
            years: totals.iter().map(|(y, _)| y).collect(),
            actual_deaths: totals.iter().map(|(_, v)| v).collect(),
            max_week,
        }
    }
}

fn round_to(v: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (v * scale).round() / scale
}

//! Time-indexed series.
//!
//! Series are ordered maps keyed by period. They are built once (from an
//! iterator or a map) and then only read.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::domain::Week;
use crate::error::MortalityError;

/// Weekly values (deaths, rates or forecasts), chronologically ordered, gaps allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySeries {
    values: BTreeMap<Week, f64>,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, week: Week) -> Option<f64> {
        self.values.get(&week).copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Week, f64)> + '_ {
        self.values.iter().map(|(w, v)| (*w, *v))
    }

    pub fn weeks(&self) -> impl DoubleEndedIterator<Item = Week> + '_ {
        self.values.keys().copied()
    }

    pub fn first_week(&self) -> Option<Week> {
        self.values.keys().next().copied()
    }

    pub fn last_week(&self) -> Option<Week> {
        self.values.keys().next_back().copied()
    }

    /// Values with `range.start <= week < range.end`.
    pub fn range(&self, range: Range<Week>) -> impl Iterator<Item = (Week, f64)> + '_ {
        self.values.range(range).map(|(w, v)| (*w, *v))
    }

    /// Weeks whose calendar year is `year` or later.
    pub fn from_year(&self, year: i32) -> WeeklySeries {
        self.iter().filter(|(w, _)| w.year() >= year).collect()
    }

    /// Distinct calendar years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.weeks().map(Week::year).collect();
        years.dedup();
        years
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

impl FromIterator<(Week, f64)> for WeeklySeries {
    fn from_iter<I: IntoIterator<Item = (Week, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<Week, f64>> for WeeklySeries {
    fn from(values: BTreeMap<Week, f64>) -> Self {
        Self { values }
    }
}

/// Yearly values (population or yearly totals), keyed by calendar year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlySeries {
    values: BTreeMap<i32, f64>,
}

impl YearlySeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.values.get(&year).copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i32, f64)> + '_ {
        self.values.iter().map(|(y, v)| (*y, *v))
    }
}

impl FromIterator<(i32, f64)> for YearlySeries {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<i32, f64>> for YearlySeries {
    fn from(values: BTreeMap<i32, f64>) -> Self {
        Self { values }
    }
}

/// Weekly values where some weeks are explicitly marked as "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GappedSeries {
    values: BTreeMap<Week, Option<f64>>,
}

impl GappedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `None` if the week is absent, `Some(None)` if it is present but has no data.
    pub fn get(&self, week: Week) -> Option<Option<f64>> {
        self.values.get(&week).copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Week, Option<f64>)> + '_ {
        self.values.iter().map(|(w, v)| (*w, *v))
    }

    pub fn gap_count(&self) -> usize {
        self.values.values().filter(|v| v.is_none()).count()
    }

    /// Drop the gaps.
    pub fn present(&self) -> WeeklySeries {
        self.iter().filter_map(|(w, v)| v.map(|v| (w, v))).collect()
    }

    /// Require every week to have data.
    pub fn complete(&self) -> Result<WeeklySeries, MortalityError> {
        self.iter()
            .map(|(w, v)| v.map(|v| (w, v)).ok_or(MortalityError::MissingPopulationData { year: w.year() }))
            .collect()
    }
}

impl FromIterator<(Week, Option<f64>)> for GappedSeries {
    fn from_iter<I: IntoIterator<Item = (Week, Option<f64>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

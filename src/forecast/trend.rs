//! Growth trend.
//!
//! For every anchor `A` we total the year that ends just before it,
//! `[A - 52, A)`, fit a straight line through those totals against calendar
//! year, and express the line at the target year relative to the line at the
//! earliest contributing year.

use crate::domain::{WEEKS_PER_YEAR, Week, WeeklySeries};
use crate::error::MortalityError;
use crate::math::fit_line;

/// Sum of one 52-week window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyTotal {
    /// Calendar year of the window's last week.
    pub year: i32,
    pub total: f64,
    /// Weeks with data inside the window (52 for a gap-free series).
    pub weeks: usize,
}

/// Totals of the 52-week windows ending just before each anchor.
///
/// Windows that start before the series' first calendar year are skipped,
/// and so are windows without a single observed week.
pub fn yearly_totals(series: &WeeklySeries, anchors: &[Week]) -> Vec<YearlyTotal> {
    let Some(earliest_year) = series.first_week().map(Week::year) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(anchors.len());
    for &anchor in anchors {
        let start = anchor.offset(-WEEKS_PER_YEAR);
        if start.year() < earliest_year {
            continue;
        }

        let (total, weeks) = series
            .range(start..anchor)
            .fold((0.0, 0usize), |(sum, n), (_, v)| (sum + v, n + 1));
        if weeks == 0 {
            continue;
        }

        out.push(YearlyTotal {
            year: anchor.offset(-1).year(),
            total,
            weeks,
        });
    }
    out
}

/// Growth ratio for `target` from the yearly totals.
pub fn growth_ratio(totals: &[YearlyTotal], target: Week) -> Result<f64, MortalityError> {
    if totals.len() < 2 {
        return Err(MortalityError::insufficient_history(
            target,
            format!("{} full prior year(s) available for the trend (need 2)", totals.len()),
        ));
    }

    let years: Vec<f64> = totals.iter().map(|t| t.year as f64).collect();
    let values: Vec<f64> = totals.iter().map(|t| t.total).collect();
    let fit = fit_line(&years, &values)
        .ok_or_else(|| MortalityError::insufficient_history(target, "yearly totals could not be fitted"))?;

    let reference_year = totals.iter().map(|t| t.year).min().unwrap_or(target.year());
    let reference = fit.evaluate(reference_year as f64);
    if !(reference.is_finite() && reference > 0.0) {
        return Err(MortalityError::DegenerateTrend { week: target });
    }

    let ratio = fit.evaluate(target.year() as f64) / reference;
    if !ratio.is_finite() {
        return Err(MortalityError::DegenerateTrend { week: target });
    }
    Ok(ratio)
}

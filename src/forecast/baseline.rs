//! Robust baseline: the outlier-trimmed mean of the same week in prior years.

use crate::domain::{WEEKS_PER_YEAR, Week, WeeklySeries};
use crate::error::MortalityError;
use crate::math::{mean, trim_outliers};

/// `target - 52k` for `k = 1..=lookback_years`, most recent first.
pub fn anchor_weeks(target: Week, lookback_years: usize) -> Vec<Week> {
    (1..=lookback_years as i64)
        .map(|k| target.offset(-k * WEEKS_PER_YEAR))
        .collect()
}

/// Mean of `values` after dropping everything outside one standard deviation
/// (plus `slack`) of the mean. `None` with fewer than two values.
pub fn robust_mean(values: &[f64], slack: f64) -> Option<f64> {
    let kept = trim_outliers(values, slack)?;
    mean(&kept)
}

/// Baseline for `target` from the values observed at `anchors`.
///
/// Anchors missing from the series are ignored; at least two must be present.
pub fn baseline(
    series: &WeeklySeries,
    target: Week,
    anchors: &[Week],
    slack: f64,
) -> Result<(f64, usize), MortalityError> {
    let values: Vec<f64> = anchors.iter().filter_map(|w| series.get(*w)).collect();
    if values.len() < 2 {
        return Err(MortalityError::insufficient_history(
            target,
            format!("{} of {} prior-year weeks have data (need 2)", values.len(), anchors.len()),
        ));
    }

    let value = robust_mean(&values, slack).ok_or_else(|| {
        MortalityError::insufficient_history(target, "no prior-year value survived outlier filtering")
    })?;
    Ok((value, values.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_step_back_whole_years() {
        let target = Week::from_iso(2021, 10).unwrap();
        let anchors = anchor_weeks(target, 3);
        assert_eq!(anchors.len(), 3);
        assert_eq!(target.weeks_until(anchors[0]), -52);
        assert_eq!(target.weeks_until(anchors[2]), -156);
    }

    #[test]
    fn spike_is_excluded_from_the_mean() {
        let value = robust_mean(&[10.0, 10.0, 10.0, 10.0, 100.0], 1.0).unwrap();
        assert_eq!(value, 10.0);
    }

    #[test]
    fn baseline_reads_anchor_values() {
        let target = Week::from_iso(2021, 10).unwrap();
        let anchors = anchor_weeks(target, 5);
        let values = [10.0, 10.0, 10.0, 10.0, 100.0];
        let series: WeeklySeries = anchors.iter().copied().zip(values).collect();

        let (value, used) = baseline(&series, target, &anchors, 1.0).unwrap();
        assert_eq!(value, 10.0);
        assert_eq!(used, 5);
    }

    #[test]
    fn one_anchor_is_not_enough() {
        let target = Week::from_iso(2021, 10).unwrap();
        let anchors = anchor_weeks(target, 5);
        let series: WeeklySeries = [(anchors[0], 12.0)].into_iter().collect();

        let err = baseline(&series, target, &anchors, 1.0).unwrap_err();
        assert!(matches!(err, MortalityError::InsufficientHistory { .. }));
    }
}

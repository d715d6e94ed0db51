//! Small-sample statistics.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

/// Keep values inside `[mean - sd - slack, mean + sd + slack]` (bounds inclusive).
///
/// Returns `None` when fewer than two values are given (the standard deviation
/// is undefined).
pub fn trim_outliers(values: &[f64], slack: f64) -> Option<Vec<f64>> {
    let m = mean(values)?;
    let sd = sample_std_dev(values)?;
    let lower = m - sd - slack;
    let upper = m + sd + slack;
    Some(values.iter().copied().filter(|v| *v >= lower && *v <= upper).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(sample_std_dev(&[1.0]).is_none());
    }

    #[test]
    fn trim_drops_the_spike() {
        let kept = trim_outliers(&[10.0, 10.0, 10.0, 10.0, 100.0], 1.0).unwrap();
        assert_eq!(kept, vec![10.0; 4]);
        assert_eq!(mean(&kept), Some(10.0));
    }

    #[test]
    fn slack_keeps_small_integer_noise() {
        // sd = 0.577...; without slack 3.0 sits outside one sigma of 2.33.
        let kept = trim_outliers(&[2.0, 2.0, 3.0], 1.0).unwrap();
        assert_eq!(kept.len(), 3);
        let strict = trim_outliers(&[2.0, 2.0, 3.0], 0.0).unwrap();
        assert_eq!(strict.len(), 2);
    }
}

//! Per-dimension descriptive statistics.

use crate::error::{AnalysisError, Result};

/// Five-number summary plus mean and sample standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct Descriptives {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator); 0.0 when n = 1.
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Quantile by linear interpolation between closest ranks (the same
/// convention as numpy's default): position (n − 1)·q into the sorted data.
/// `sorted` must be non-empty and ascending.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// Describe a sample. Fails with [`AnalysisError::EmptyInput`] on an empty
/// slice.
pub fn describe(values: &[f64]) -> Result<Descriptives> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput { context: "descriptive statistics".to_string() });
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Ok(Descriptives {
        n,
        mean,
        std,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn describe_small_sample() {
        let d = describe(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(d.n, 4);
        assert_abs_diff_eq!(d.mean, 2.5, epsilon = 1e-12);
        // Sample variance: (2.25 + 0.25 + 0.25 + 2.25) / 3 = 5/3.
        assert_abs_diff_eq!(d.std, (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(d.q1, 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(d.median, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(d.q3, 3.25, epsilon = 1e-12);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
    }

    #[test]
    fn describe_single_value() {
        let d = describe(&[3.0]).unwrap();
        assert_eq!(d.std, 0.0);
        assert_eq!(d.median, 3.0);
    }

    #[test]
    fn describe_rejects_empty() {
        assert!(matches!(
            describe(&[]).unwrap_err(),
            AnalysisError::EmptyInput { .. }
        ));
    }

    #[test]
    fn quantile_exact_positions() {
        let sorted = [10.0, 20.0, 30.0];
        assert_eq!(quantile(&sorted, 0.0), 10.0);
        assert_eq!(quantile(&sorted, 0.5), 20.0);
        assert_eq!(quantile(&sorted, 1.0), 30.0);
        assert_abs_diff_eq!(quantile(&sorted, 0.25), 15.0, epsilon = 1e-12);
    }
}

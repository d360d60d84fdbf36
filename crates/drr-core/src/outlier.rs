//! Outlier flagging on the total complexity score.
//!
//! Tukey fences: a case whose total falls outside
//! [Q1 − 1.5·IQR, Q3 + 1.5·IQR] is flagged. Flagged cases stay in the
//! Stage 1 output with `outlier = true`; downstream stages exclude them.

use crate::error::Result;
use crate::stats::descriptive::quantile;

const FENCE_FACTOR: f64 = 1.5;

/// Tukey fence interval for a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lower: f64,
    pub upper: f64,
}

/// Compute the Tukey fences of a non-empty sample.
pub fn tukey_fences(values: &[f64]) -> Result<Fences> {
    if values.is_empty() {
        return Err(crate::error::AnalysisError::EmptyInput {
            context: "outlier fences".to_string(),
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    Ok(Fences {
        lower: q1 - FENCE_FACTOR * iqr,
        upper: q3 + FENCE_FACTOR * iqr,
    })
}

/// Per-value outlier flags, aligned with the input order.
pub fn flag_outliers(values: &[f64]) -> Result<Vec<bool>> {
    let fences = tukey_fences(values)?;
    Ok(values
        .iter()
        .map(|&v| v < fences.lower || v > fences.upper)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fences_for_small_sample() {
        // Sorted: [10, 11, 12, 12, 13, 40]; Q1 = 11.25, Q3 = 12.75, IQR = 1.5.
        let fences = tukey_fences(&[10.0, 12.0, 11.0, 13.0, 12.0, 40.0]).unwrap();
        assert_abs_diff_eq!(fences.lower, 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fences.upper, 15.0, epsilon = 1e-12);
    }

    #[test]
    fn extreme_total_is_flagged() {
        let flags = flag_outliers(&[10.0, 12.0, 11.0, 13.0, 12.0, 40.0]).unwrap();
        assert_eq!(flags, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn tight_sample_has_no_outliers() {
        let flags = flag_outliers(&[14.0, 15.0, 15.0, 16.0]).unwrap();
        assert!(flags.iter().all(|&f| !f));
    }

    #[test]
    fn empty_sample_is_rejected() {
        assert!(tukey_fences(&[]).is_err());
    }
}

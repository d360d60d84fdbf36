//! Significance bucketing of p-values.
//!
//! Four ordered categories partition [0, 1] with no gaps or overlaps.
//! Boundaries are inclusive on the lower (more significant) side: a p-value
//! exactly equal to a threshold belongs to the stricter bucket.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Significance category of a p-value, ordered from most to least
/// significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignificanceBucket {
    /// p ≤ 0.001
    AtMost001,
    /// 0.001 < p ≤ 0.01
    AtMost01,
    /// 0.01 < p ≤ 0.05
    AtMost05,
    /// p > 0.05
    Above05,
}

impl SignificanceBucket {
    /// Stable ASCII label used in exported tables and figure legends.
    pub fn label(self) -> &'static str {
        match self {
            SignificanceBucket::AtMost001 => "p<=0.001",
            SignificanceBucket::AtMost01 => "0.001<p<=0.01",
            SignificanceBucket::AtMost05 => "0.01<p<=0.05",
            SignificanceBucket::Above05 => "p>0.05",
        }
    }

    /// Conventional star annotation for figure cells.
    pub fn stars(self) -> &'static str {
        match self {
            SignificanceBucket::AtMost001 => "***",
            SignificanceBucket::AtMost01 => "**",
            SignificanceBucket::AtMost05 => "*",
            SignificanceBucket::Above05 => "",
        }
    }
}

impl std::fmt::Display for SignificanceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a p-value into its bucket.
///
/// Fails with [`AnalysisError::InvalidProbability`] for NaN or values
/// outside [0, 1]; those can only come from a broken upstream computation.
pub fn classify(p_value: f64) -> Result<SignificanceBucket> {
    if !p_value.is_finite() || !(0.0..=1.0).contains(&p_value) {
        return Err(AnalysisError::InvalidProbability { value: p_value });
    }
    Ok(if p_value <= 0.001 {
        SignificanceBucket::AtMost001
    } else if p_value <= 0.01 {
        SignificanceBucket::AtMost01
    } else if p_value <= 0.05 {
        SignificanceBucket::AtMost05
    } else {
        SignificanceBucket::Above05
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_belong_to_stricter_bucket() {
        assert_eq!(classify(0.001).unwrap(), SignificanceBucket::AtMost001);
        assert_eq!(classify(0.01).unwrap(), SignificanceBucket::AtMost01);
        assert_eq!(classify(0.05).unwrap(), SignificanceBucket::AtMost05);
    }

    #[test]
    fn interior_values() {
        assert_eq!(classify(0.0).unwrap(), SignificanceBucket::AtMost001);
        assert_eq!(classify(0.0011).unwrap(), SignificanceBucket::AtMost01);
        assert_eq!(classify(0.02).unwrap(), SignificanceBucket::AtMost05);
        assert_eq!(classify(0.0501).unwrap(), SignificanceBucket::Above05);
        assert_eq!(classify(1.0).unwrap(), SignificanceBucket::Above05);
    }

    #[test]
    fn out_of_range_is_rejected() {
        for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let err = classify(bad).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidProbability { .. }), "p = {bad}");
        }
    }

    #[test]
    fn buckets_are_ordered() {
        assert!(SignificanceBucket::AtMost001 < SignificanceBucket::AtMost01);
        assert!(SignificanceBucket::AtMost01 < SignificanceBucket::AtMost05);
        assert!(SignificanceBucket::AtMost05 < SignificanceBucket::Above05);
    }
}

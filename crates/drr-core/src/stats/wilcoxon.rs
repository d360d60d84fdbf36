//! Pairwise Wilcoxon rank-sum test with Bonferroni adjustment.
//!
//! Two-sided normal approximation with tie-corrected variance and a
//! continuity correction. Exact small-sample tables are not implemented:
//! the group sizes in this dataset sit where the corrected normal
//! approximation is the standard choice.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AnalysisError, Result};
use crate::stats::rank::{average_ranks, tie_term};

#[derive(Debug, Clone, Copy)]
pub struct RankSumResult {
    /// Mann-Whitney U of the first group.
    pub u: f64,
    /// Continuity-corrected standard score.
    pub z: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Wilcoxon rank-sum test of two independent samples.
pub fn rank_sum(a: &[f64], b: &[f64]) -> Result<RankSumResult> {
    if a.is_empty() || b.is_empty() {
        return Err(AnalysisError::DegenerateInput {
            subject: "rank-sum".to_string(),
            detail: "both groups must be non-empty".to_string(),
        });
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = average_ranks(&pooled);

    let r1: f64 = ranks[..a.len()].iter().sum();
    let u = r1 - n1 * (n1 + 1.0) / 2.0;
    let mu = n1 * n2 / 2.0;

    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term(&pooled) / (n * (n - 1.0)));
    if variance <= 0.0 {
        return Err(AnalysisError::DegenerateInput {
            subject: "rank-sum".to_string(),
            detail: "all pooled values are tied".to_string(),
        });
    }

    // Continuity correction shrinks |U − mu| by 0.5, never past zero.
    let diff = u - mu;
    let corrected = (diff.abs() - 0.5).max(0.0) * diff.signum();
    let z = corrected / variance.sqrt();

    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalysisError::DegenerateInput {
        subject: "normal distribution".to_string(),
        detail: e.to_string(),
    })?;
    let p_value = (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0);

    Ok(RankSumResult { u, z, p_value })
}

/// Bonferroni adjustment: multiply by the number of comparisons in the
/// family, clamped at 1.
pub fn bonferroni(p_value: f64, comparisons: usize) -> f64 {
    if comparisons == 0 {
        return p_value;
    }
    (p_value * comparisons as f64).min(1.0)
}

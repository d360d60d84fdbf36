//! Kruskal-Wallis H test across hazard groups.
//!
//! Tie-corrected H referred to a χ² distribution with k − 1 degrees of
//! freedom. Ratings are heavily tied (five-point ordinal scale), so the tie
//! correction is not optional here.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{AnalysisError, Result};
use crate::stats::rank::{average_ranks, tie_term};

#[derive(Debug, Clone, Copy)]
pub struct KruskalResult {
    /// Tie-corrected H statistic.
    pub h: f64,
    /// Degrees of freedom, k − 1.
    pub df: usize,
    /// Upper-tail χ² p-value.
    pub p_value: f64,
}

/// Kruskal-Wallis H over two or more non-empty groups.
pub fn kruskal_wallis(groups: &[Vec<f64>]) -> Result<KruskalResult> {
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::DegenerateInput {
            subject: "kruskal-wallis".to_string(),
            detail: format!("requires at least 2 groups, got {k}"),
        });
    }
    for (idx, g) in groups.iter().enumerate() {
        if g.is_empty() {
            return Err(AnalysisError::DegenerateInput {
                subject: "kruskal-wallis".to_string(),
                detail: format!("group {idx} is empty"),
            });
        }
    }

    let pooled: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = pooled.len();
    if n < 3 {
        return Err(AnalysisError::DegenerateInput {
            subject: "kruskal-wallis".to_string(),
            detail: format!("requires at least 3 observations, got {n}"),
        });
    }

    let ranks = average_ranks(&pooled);

    // Group rank sums over the pooled ranking.
    let nf = n as f64;
    let mut rank_sum_term = 0.0;
    let mut offset = 0;
    for g in groups {
        let r: f64 = ranks[offset..offset + g.len()].iter().sum();
        rank_sum_term += r * r / g.len() as f64;
        offset += g.len();
    }
    let h_raw = 12.0 / (nf * (nf + 1.0)) * rank_sum_term - 3.0 * (nf + 1.0);

    let correction = 1.0 - tie_term(&pooled) / (nf * nf * nf - nf);
    if correction <= 0.0 {
        return Err(AnalysisError::DegenerateInput {
            subject: "kruskal-wallis".to_string(),
            detail: "all pooled values are tied".to_string(),
        });
    }
    let h = h_raw / correction;

    let df = k - 1;
    let chi2 = ChiSquared::new(df as f64).map_err(|e| AnalysisError::DegenerateInput {
        subject: "chi-squared".to_string(),
        detail: e.to_string(),
    })?;
    let p_value = (1.0 - chi2.cdf(h)).clamp(0.0, 1.0);

    Ok(KruskalResult { h, df, p_value })
}

//! Spearman rank correlation with a two-sided p-value.
//!
//! The coefficient is the Pearson correlation of the two samples'
//! average-rank transforms. Ties share the mean rank, which matters here:
//! the boolean high/low views produce many ties.
//!
//! Two p-value methods, selected automatically and reported in the result:
//!
//! - **Exact permutation** when n ≤ 9 and neither sample contains ties:
//!   the full n! null distribution of rank permutations is enumerated and
//!   the two-sided p is the fraction of permutations whose |ρ| reaches the
//!   observed |ρ|. At these sizes the t-approximation is not trustworthy.
//! - **t-approximation** otherwise: t = ρ·√((n−2)/(1−ρ²)) referred to a
//!   Student-t distribution with n−2 degrees of freedom.
//!
//! The two methods can disagree at small n, which is why the one actually
//! used is carried in [`SpearmanResult::method`].

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{AnalysisError, Result};
use crate::stats::rank::{average_ranks, has_ties};

/// Largest n for which the exact permutation null is enumerated (9! ≈ 3.6e5).
const MAX_EXACT_N: usize = 9;

/// Which null-distribution method produced the p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PValueMethod {
    ExactPermutation,
    TApproximation,
}

#[derive(Debug, Clone, Copy)]
pub struct SpearmanResult {
    /// Spearman's ρ in [-1, 1].
    pub rho: f64,
    /// Two-sided p-value in [0, 1].
    pub p_value: f64,
    pub method: PValueMethod,
}

/// Spearman rank correlation of two paired samples.
///
/// Fails on length disagreement, n < 3, or a zero-variance sample; callers
/// that know their column names should attach them when propagating.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<SpearmanResult> {
    if x.len() != y.len() {
        return Err(AnalysisError::ShapeMismatch {
            column: "paired sample".to_string(),
            len: y.len(),
            expected: x.len(),
        });
    }
    let n = x.len();
    if n < 3 {
        return Err(AnalysisError::DegenerateInput {
            subject: "spearman".to_string(),
            detail: format!("requires at least 3 paired observations, got {n}"),
        });
    }
    if is_constant(x) || is_constant(y) {
        return Err(AnalysisError::DegenerateInput {
            subject: "spearman".to_string(),
            detail: "zero-variance sample".to_string(),
        });
    }

    let rx = average_ranks(x);
    let ry = average_ranks(y);
    let rho = pearson_on_ranks(&rx, &ry);

    if n <= MAX_EXACT_N && !has_ties(x) && !has_ties(y) {
        let p_value = exact_two_sided_p(&rx, &ry, rho.abs());
        Ok(SpearmanResult { rho, p_value, method: PValueMethod::ExactPermutation })
    } else {
        let p_value = t_two_sided_p(rho, n)?;
        Ok(SpearmanResult { rho, p_value, method: PValueMethod::TApproximation })
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Pearson r of two rank vectors.
///
/// The denominator is the single square root of the variance product, so a
/// perfectly monotone pairing yields exactly ±1.0 rather than a value one
/// ulp away from it.
fn pearson_on_ranks(rx: &[f64], ry: &[f64]) -> f64 {
    let n = rx.len() as f64;
    let mean_x = rx.iter().sum::<f64>() / n;
    let mean_y = ry.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in rx.iter().zip(ry) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    (num / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Exact two-sided p by full enumeration of rank permutations.
///
/// Both rank vectors are tie-free here, so every ρ can use the closed form
/// ρ = 1 − 6·Σd²/(n(n²−1)). Enumeration is Heap's algorithm over ry.
fn exact_two_sided_p(rx: &[f64], ry: &[f64], observed_abs: f64) -> f64 {
    let n = rx.len();
    let denom = (n * (n * n - 1)) as f64;

    let mut perm = ry.to_vec();
    let mut hits: u64 = 0;
    let mut total: u64 = 0;
    let mut visit = |p: &[f64]| {
        let d2: f64 = rx.iter().zip(p).map(|(&a, &b)| (a - b) * (a - b)).sum();
        let rho = 1.0 - 6.0 * d2 / denom;
        total += 1;
        if rho.abs() >= observed_abs - 1e-12 {
            hits += 1;
        }
    };
    heap_permute(&mut perm, n, &mut visit);

    hits as f64 / total as f64
}

fn heap_permute(arr: &mut [f64], k: usize, visit: &mut impl FnMut(&[f64])) {
    if k <= 1 {
        visit(arr);
        return;
    }
    for i in 0..k - 1 {
        heap_permute(arr, k - 1, visit);
        if k % 2 == 0 {
            arr.swap(i, k - 1);
        } else {
            arr.swap(0, k - 1);
        }
    }
    heap_permute(arr, k - 1, visit);
}

/// Two-sided p from the t-approximation with n − 2 degrees of freedom.
fn t_two_sided_p(rho: f64, n: usize) -> Result<f64> {
    let one_minus_r2 = 1.0 - rho * rho;
    if one_minus_r2 <= f64::EPSILON {
        return Ok(0.0);
    }
    let df = (n - 2) as f64;
    let t = rho.abs() * (df / one_minus_r2).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| AnalysisError::DegenerateInput {
        subject: "t-distribution".to_string(),
        detail: e.to_string(),
    })?;
    Ok((2.0 * (1.0 - dist.cdf(t))).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn perfect_inverse_is_exactly_minus_one() {
        let r = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5.0, 4.0, 3.0, 2.0, 1.0]).unwrap();
        assert_eq!(r.rho, -1.0, "coefficient must be exactly -1, got {}", r.rho);
        assert_eq!(r.method, PValueMethod::ExactPermutation);
        // Of the 120 rank permutations at n = 5, only the two perfectly
        // monotone ones reach |rho| = 1.
        assert_abs_diff_eq!(r.p_value, 2.0 / 120.0, epsilon = 1e-12);
    }

    #[test]
    fn identical_samples_are_exactly_plus_one() {
        let r = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        assert_eq!(r.rho, 1.0);
        assert_abs_diff_eq!(r.p_value, 2.0 / 120.0, epsilon = 1e-12);
    }

    #[test]
    fn tied_boolean_complements_use_t_approximation() {
        // Complementary boolean columns: monotone inverse through the ranks,
        // but the ties route the p-value to the t-approximation.
        let r = spearman(&[0.0, 1.0, 1.0, 0.0, 1.0], &[1.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        assert_eq!(r.rho, -1.0);
        assert_eq!(r.method, PValueMethod::TApproximation);
        assert_eq!(r.p_value, 0.0);
    }

    #[test]
    fn large_n_uses_t_approximation() {
        // n = 12, tie-free, one adjacent swap from perfect agreement.
        let x: Vec<f64> = (1..=12).map(f64::from).collect();
        let mut y = x.clone();
        y.swap(10, 11);
        let r = spearman(&x, &y).unwrap();
        assert_eq!(r.method, PValueMethod::TApproximation);
        // Σd² = 2 → rho = 1 − 12/(12·143).
        assert_abs_diff_eq!(r.rho, 1.0 - 12.0 / 1716.0, epsilon = 1e-12);
        assert!(r.p_value < 1e-6, "near-perfect agreement at n=12, got p = {}", r.p_value);
    }

    #[test]
    fn exact_p_is_a_valid_probability_for_weak_association() {
        let r = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]).unwrap();
        assert_eq!(r.method, PValueMethod::ExactPermutation);
        assert!(r.rho > 0.0 && r.rho < 1.0);
        assert!(r.p_value > 0.0 && r.p_value <= 1.0);
    }

    #[test]
    fn constant_sample_is_degenerate() {
        let err = spearman(&[3.0, 3.0, 3.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput { .. }));
    }

    #[test]
    fn too_few_observations_is_degenerate() {
        let err = spearman(&[1.0, 2.0], &[2.0, 1.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput { .. }));
    }

    #[test]
    fn length_mismatch_is_shape_error() {
        let err = spearman(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { .. }));
    }
}

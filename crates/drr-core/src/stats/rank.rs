//! Rank transforms with average-rank tie handling.
//!
//! Every rank-based statistic in this crate (Spearman, Kruskal-Wallis,
//! Wilcoxon rank-sum) goes through [`average_ranks`], so ties are handled
//! identically everywhere. The boolean high/low transform views make heavy
//! ties the normal case, not an edge case.

/// 1-based ranks; tied values share the mean of the ranks they occupy.
///
/// `[10, 20, 20, 30]` → `[1.0, 2.5, 2.5, 4.0]`.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j (0-based) hold ranks i+1..=j; ties share the mean.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &k in &order[i..j] {
            ranks[k] = avg;
        }
        i = j;
    }
    ranks
}

/// True if any two values are equal.
pub fn has_ties(values: &[f64]) -> bool {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.windows(2).any(|w| w[0] == w[1])
}

/// Tie term Σ(t³ − t) over groups of tied values, used by the tie-corrected
/// variance formulas in Kruskal-Wallis and the rank-sum test.
pub fn tie_term(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        term += t * t * t - t;
        i = j;
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_without_ties_are_positions() {
        assert_eq!(average_ranks(&[30.0, 10.0, 20.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn tied_values_share_average_rank() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
        // All tied: every rank is the midpoint (n+1)/2.
        assert_eq!(average_ranks(&[7.0, 7.0, 7.0]), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn boolean_column_ranks() {
        // Two zeros share ranks {1,2}, three ones share ranks {3,4,5}.
        assert_eq!(
            average_ranks(&[0.0, 1.0, 1.0, 0.0, 1.0]),
            vec![1.5, 4.0, 4.0, 1.5, 4.0]
        );
    }

    #[test]
    fn tie_term_counts_tie_groups() {
        // No ties: zero.
        assert_eq!(tie_term(&[1.0, 2.0, 3.0]), 0.0);
        // One pair: 2³ − 2 = 6. One triple: 3³ − 3 = 24.
        assert_eq!(tie_term(&[1.0, 2.0, 2.0]), 6.0);
        assert_eq!(tie_term(&[5.0, 5.0, 5.0]), 24.0);
        assert_eq!(tie_term(&[0.0, 0.0, 1.0, 1.0, 1.0]), 30.0);
    }

    #[test]
    fn has_ties_detects_duplicates() {
        assert!(!has_ties(&[1.0, 2.0, 3.0]));
        assert!(has_ties(&[1.0, 2.0, 1.0]));
    }
}

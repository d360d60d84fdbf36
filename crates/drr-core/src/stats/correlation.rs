//! Pairwise dimension correlation/significance matrix.
//!
//! For a table of dimension columns, computes the full symmetric matrix of
//! Spearman coefficients and two-sided p-values, with each pair classified
//! into a significance bucket. Used identically for the high-rating and
//! low-rating co-occurrence views.

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::stats::significance::{classify, SignificanceBucket};
use crate::stats::spearman::spearman;
use crate::table::DimensionTable;

/// Correlation and significance of one unordered dimension pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseResult {
    /// Spearman ρ in [-1, 1].
    pub coefficient: f64,
    /// Two-sided p-value in [0, 1].
    pub p_value: f64,
    pub bucket: SignificanceBucket,
}

/// Self-pairs are fixed by construction, never computed: running a rank
/// correlation of a column against itself is undefined for the
/// zero-variance boolean columns the transform views can produce.
const SELF_PAIR: PairwiseResult = PairwiseResult {
    coefficient: 1.0,
    p_value: 0.0,
    bucket: SignificanceBucket::AtMost001,
};

/// Fully populated square mapping from (dimension, dimension) to
/// [`PairwiseResult`]. Exactly symmetric: both cells of an unordered pair
/// are written from one computation, so they are bit-for-bit identical.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    dims: Vec<String>,
    /// Row-major D×D.
    cells: Vec<PairwiseResult>,
}

/// One row of the exported flat pair table.
#[derive(Debug, Clone, Serialize)]
pub struct PairRow {
    pub dim_a: String,
    pub dim_b: String,
    pub coefficient: f64,
    pub p_value: f64,
    pub significance_bucket: String,
}

impl CorrelationMatrix {
    /// Dimension names, in table column order.
    pub fn dimensions(&self) -> &[String] {
        &self.dims
    }

    pub fn size(&self) -> usize {
        self.dims.len()
    }

    /// Cell by positional indices.
    pub fn get(&self, i: usize, j: usize) -> PairwiseResult {
        self.cells[i * self.dims.len() + j]
    }

    /// Cell by dimension names.
    pub fn get_by_name(&self, a: &str, b: &str) -> Result<PairwiseResult> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Ok(self.get(i, j))
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == name)
            .ok_or_else(|| AnalysisError::UnknownDimension { name: name.to_string() })
    }

    /// Flat table with one row per ordered pair, diagonal included, so a
    /// symmetric heatmap can be rendered straight from the rows.
    pub fn flat_rows(&self) -> Vec<PairRow> {
        let d = self.dims.len();
        let mut rows = Vec::with_capacity(d * d);
        for a in 0..d {
            for b in 0..d {
                let cell = self.get(a, b);
                rows.push(PairRow {
                    dim_a: self.dims[a].clone(),
                    dim_b: self.dims[b].clone(),
                    coefficient: cell.coefficient,
                    p_value: cell.p_value,
                    significance_bucket: cell.bucket.label().to_string(),
                });
            }
        }
        rows
    }
}

/// Build the correlation matrix for a dimension table.
///
/// Requires at least 2 columns and at least 3 rows, and rejects any
/// constant column up front: Spearman correlation is undefined against
/// zero variance, and the alternative is a NaN silently reaching an
/// exported table.
///
/// Each unordered pair is computed exactly once and written to both cells.
pub fn compute_correlation_matrix(table: &DimensionTable) -> Result<CorrelationMatrix> {
    let d = table.n_columns();
    if d < 2 {
        return Err(AnalysisError::DegenerateInput {
            subject: "correlation matrix".to_string(),
            detail: format!("requires at least 2 columns, got {d}"),
        });
    }

    let n = table.n_rows();
    for (idx, name) in table.names().iter().enumerate() {
        let len = table.column(idx).len();
        if len != n {
            return Err(AnalysisError::ShapeMismatch {
                column: name.clone(),
                len,
                expected: n,
            });
        }
    }
    if n < 3 {
        return Err(AnalysisError::DegenerateInput {
            subject: "correlation matrix".to_string(),
            detail: format!("requires at least 3 rows, got {n}"),
        });
    }
    for (idx, name) in table.names().iter().enumerate() {
        let col = table.column(idx);
        if col.windows(2).all(|w| w[0] == w[1]) {
            return Err(AnalysisError::DegenerateInput {
                subject: name.clone(),
                detail: "column is constant; rank correlation against it is undefined".to_string(),
            });
        }
    }

    let dims = table.names().to_vec();
    let mut cells = vec![SELF_PAIR; d * d];

    for i in 0..d {
        for j in i + 1..d {
            let r = spearman(table.column(i), table.column(j)).map_err(|e| {
                AnalysisError::DegenerateInput {
                    subject: format!("{}/{}", dims[i], dims[j]),
                    detail: e.to_string(),
                }
            })?;
            let cell = PairwiseResult {
                coefficient: r.rho,
                p_value: r.p_value,
                bucket: classify(r.p_value)?,
            };
            cells[i * d + j] = cell;
            cells[j * d + i] = cell;
        }
    }

    Ok(CorrelationMatrix { dims, cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table_of(cols: &[(&str, &[f64])]) -> DimensionTable {
        let mut t = DimensionTable::new();
        for (name, vals) in cols {
            t.push_column(name, vals.to_vec()).unwrap();
        }
        t
    }

    fn mixed_table() -> DimensionTable {
        table_of(&[
            ("uncertainty", &[1.0, 5.0, 4.0, 2.0, 5.0, 3.0]),
            ("interdependency", &[2.0, 4.0, 5.0, 1.0, 4.0, 3.0]),
            ("volatility", &[5.0, 1.0, 2.0, 4.0, 2.0, 3.0]),
        ])
    }

    #[test]
    fn matrix_is_bitwise_symmetric() {
        let m = compute_correlation_matrix(&mixed_table()).unwrap();
        for i in 0..m.size() {
            for j in 0..m.size() {
                let a = m.get(i, j);
                let b = m.get(j, i);
                assert_eq!(
                    a.coefficient.to_bits(),
                    b.coefficient.to_bits(),
                    "coefficient ({i},{j}) vs ({j},{i})"
                );
                assert_eq!(a.p_value.to_bits(), b.p_value.to_bits(), "p ({i},{j}) vs ({j},{i})");
                assert_eq!(a.bucket, b.bucket);
            }
        }
    }

    #[test]
    fn self_pairs_are_fixed() {
        let m = compute_correlation_matrix(&mixed_table()).unwrap();
        for i in 0..m.size() {
            let cell = m.get(i, i);
            assert_eq!(cell.coefficient, 1.0);
            assert_eq!(cell.p_value, 0.0);
            assert_eq!(cell.bucket, SignificanceBucket::AtMost001);
        }
    }

    #[test]
    fn coefficients_and_p_values_stay_in_range() {
        let m = compute_correlation_matrix(&mixed_table()).unwrap();
        for row in m.flat_rows() {
            assert!((-1.0..=1.0).contains(&row.coefficient), "rho = {}", row.coefficient);
            assert!((0.0..=1.0).contains(&row.p_value), "p = {}", row.p_value);
        }
    }

    #[test]
    fn perfect_inverse_pair_pins_small_n_p_value() {
        let m = compute_correlation_matrix(&table_of(&[
            ("uncertainty", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            ("volatility", &[5.0, 4.0, 3.0, 2.0, 1.0]),
        ]))
        .unwrap();
        let cell = m.get_by_name("uncertainty", "volatility").unwrap();
        assert_eq!(cell.coefficient, -1.0);
        // Exact permutation p at n = 5: 2 of 120 permutations reach |rho| = 1.
        assert_abs_diff_eq!(cell.p_value, 2.0 / 120.0, epsilon = 1e-12);
        // At n = 5 even a perfect monotone inverse cannot reach the
        // strictest bucket.
        assert_eq!(cell.bucket, SignificanceBucket::AtMost05);
    }

    #[test]
    fn constant_column_is_rejected_by_name() {
        let err = compute_correlation_matrix(&table_of(&[
            ("uncertainty", &[1.0, 2.0, 3.0, 4.0]),
            ("overlaps", &[3.0, 3.0, 3.0, 3.0]),
        ]))
        .unwrap_err();
        match err {
            AnalysisError::DegenerateInput { subject, .. } => assert_eq!(subject, "overlaps"),
            other => panic!("expected DegenerateInput, got {other:?}"),
        }
    }

    #[test]
    fn fewer_than_two_columns_is_rejected() {
        let err =
            compute_correlation_matrix(&table_of(&[("uncertainty", &[1.0, 2.0, 3.0])])).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput { .. }));
    }

    #[test]
    fn fewer_than_three_rows_is_rejected() {
        let err = compute_correlation_matrix(&table_of(&[
            ("uncertainty", &[1.0, 2.0]),
            ("volatility", &[2.0, 1.0]),
        ]))
        .unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput { .. }));
    }

    #[test]
    fn flat_rows_cover_every_ordered_pair() {
        let m = compute_correlation_matrix(&mixed_table()).unwrap();
        let rows = m.flat_rows();
        assert_eq!(rows.len(), 9);
        // Both orderings of each off-diagonal pair are present and agree.
        let find = |a: &str, b: &str| {
            rows.iter()
                .find(|r| r.dim_a == a && r.dim_b == b)
                .unwrap_or_else(|| panic!("missing row {a}/{b}"))
                .clone()
        };
        let ab = find("uncertainty", "volatility");
        let ba = find("volatility", "uncertainty");
        assert_eq!(ab.coefficient.to_bits(), ba.coefficient.to_bits());
        assert_eq!(ab.p_value.to_bits(), ba.p_value.to_bits());
        assert_eq!(find("uncertainty", "uncertainty").coefficient, 1.0);
    }

    #[test]
    fn boolean_views_build_without_nan() {
        // Ratings whose high view has variance in every column.
        let ratings = table_of(&[
            ("uncertainty", &[1.0, 5.0, 4.0, 2.0, 5.0]),
            ("interdependency", &[4.0, 2.0, 5.0, 1.0, 4.0]),
            ("volatility", &[2.0, 4.0, 1.0, 5.0, 3.0]),
        ]);
        for view in [ratings.high_view(), ratings.low_view()] {
            let m = compute_correlation_matrix(&view).unwrap();
            for row in m.flat_rows() {
                assert!(row.coefficient.is_finite());
                assert!(row.p_value.is_finite());
            }
        }
    }
}

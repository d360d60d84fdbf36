//! Column-oriented table of ordinal dimension values.
//!
//! One column per complexity dimension, one row per case study. All columns
//! share a single row ordering and length; the constructor enforces this so
//! downstream statistics never see ragged input.

use crate::error::{AnalysisError, Result};
use crate::score::{HIGH_RATING_MIN, LOW_RATING_MAX};

/// The five complexity dimensions, in publication order.
pub const DIMENSIONS: [&str; 5] = [
    "uncertainty",
    "interdependency",
    "multi_levels",
    "volatility",
    "overlaps",
];

/// An ordered collection of equally long named columns.
///
/// Values are stored as `f64` over a numeric ordinal domain: raw ratings
/// occupy 1.0–5.0, boolean transform views occupy {0.0, 1.0}.
#[derive(Debug, Clone)]
pub struct DimensionTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl DimensionTable {
    /// Create an empty table. Columns are added with [`push_column`].
    ///
    /// [`push_column`]: DimensionTable::push_column
    pub fn new() -> Self {
        Self { names: Vec::new(), columns: Vec::new() }
    }

    /// Append a named column. Fails with [`AnalysisError::ShapeMismatch`]
    /// if its length differs from the columns already present.
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if let Some(first) = self.columns.first() {
            if values.len() != first.len() {
                return Err(AnalysisError::ShapeMismatch {
                    column: name.to_string(),
                    len: values.len(),
                    expected: first.len(),
                });
            }
        }
        self.names.push(name.to_string());
        self.columns.push(values);
        Ok(())
    }

    /// Number of rows (cases). Zero for an empty table.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Number of columns (dimensions).
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names, in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column values by positional index.
    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    /// Column values by name.
    pub fn column_by_name(&self, name: &str) -> Result<&[f64]> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| AnalysisError::UnknownDimension { name: name.to_string() })?;
        Ok(&self.columns[idx])
    }

    /// High-rating view: each cell becomes 1.0 when the rating is ≥ 4,
    /// else 0.0. Computed per cell, independently per dimension.
    pub fn high_view(&self) -> DimensionTable {
        self.threshold_view(|v| v >= f64::from(HIGH_RATING_MIN))
    }

    /// Low-rating view: each cell becomes 1.0 when the rating is ≤ 2,
    /// else 0.0. Not the complement of the high view: a rating of 3 is
    /// neither high nor low.
    pub fn low_view(&self) -> DimensionTable {
        self.threshold_view(|v| v <= f64::from(LOW_RATING_MAX))
    }

    fn threshold_view(&self, pred: impl Fn(f64) -> bool) -> DimensionTable {
        DimensionTable {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| col.iter().map(|&v| if pred(v) { 1.0 } else { 0.0 }).collect())
                .collect(),
        }
    }
}

impl Default for DimensionTable {
    fn default() -> Self {
        Self::new()
    }
}

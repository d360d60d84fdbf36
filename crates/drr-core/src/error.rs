//! Error taxonomy shared across the pipeline stages.
//!
//! Every error here is fatal: the pipeline is a one-shot deterministic run
//! over an already-collected dataset, so any failure indicates a data or
//! logic defect upstream and must stop the run rather than be masked.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Column lengths disagree within one table.
    #[error("column `{column}` has {len} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        len: usize,
        expected: usize,
    },

    /// Input on which rank statistics are undefined: a zero-variance
    /// column, too few observations, or an all-tied pooled sample.
    #[error("degenerate input for `{subject}`: {detail}")]
    DegenerateInput { subject: String, detail: String },

    /// A probability outside [0, 1] reached significance bucketing.
    /// Indicates a bug in an upstream computation, not in the caller's data.
    #[error("p-value {value} is outside [0, 1]")]
    InvalidProbability { value: f64 },

    /// A stage received zero usable rows.
    #[error("no usable rows in {context}")]
    EmptyInput { context: String },

    /// A case's administrative region has no gazetteer entry.
    #[error("no gazetteer entry for region `{region}` (case `{case}`)")]
    UnknownRegion { region: String, case: String },

    /// A rating outside the 1..=5 ordinal scale survived cleaning.
    #[error("rating {value} for `{dimension}` is outside 1..=5")]
    InvalidRating { dimension: String, value: i64 },

    /// Lookup of a dimension name not present in a table or matrix.
    #[error("unknown dimension `{name}`")]
    UnknownDimension { name: String },
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

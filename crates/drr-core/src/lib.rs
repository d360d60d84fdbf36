//! Core library for the disaster-risk-reduction complexity case-study
//! analysis: survey cleaning, centroid geocoding, summary scores, outlier
//! fences, and the non-parametric statistics behind the published tables
//! and figures.

pub mod error;
pub mod geocode;
pub mod outlier;
pub mod score;
pub mod stats;
pub mod survey;
pub mod table;

pub use error::{AnalysisError, Result};
pub use table::DimensionTable;

//! Per-case summary scores derived from the five dimension ratings.

use serde::{Deserialize, Serialize};

/// Smallest rating counted as "high" in the boolean transform views.
pub const HIGH_RATING_MIN: u8 = 4;
/// Largest rating counted as "low" in the boolean transform views.
pub const LOW_RATING_MAX: u8 = 2;

/// Summary scores for one case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SummaryScores {
    /// Sum of the five ratings, 5–25.
    pub total: u32,
    /// Mean rating, 1.0–5.0.
    pub mean: f64,
    /// Number of dimensions rated high (≥ 4), 0–5.
    pub high_count: u32,
}

/// Derive the summary scores from one case's ratings.
pub fn summarize(ratings: &[u8; 5]) -> SummaryScores {
    let total: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    let high_count = ratings.iter().filter(|&&r| r >= HIGH_RATING_MIN).count() as u32;
    SummaryScores {
        total,
        mean: f64::from(total) / 5.0,
        high_count,
    }
}

//! Raw survey rows, cleaning, and the cleaned per-case record.
//!
//! The raw table arrives as free-text CSV fields; cleaning trims whitespace,
//! parses the five ratings, and drops any row with a missing or out-of-range
//! rating. Dropped rows are reported, never silently discarded.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::score::SummaryScores;
use crate::table::{DimensionTable, DIMENSIONS};

/// One record of the raw survey export. Ratings are kept as text because
/// the export contains blanks and stray annotations.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSurveyRow {
    pub case_name: String,
    pub country: String,
    pub region: String,
    pub hazard_type: String,
    pub uncertainty: String,
    pub interdependency: String,
    pub multi_levels: String,
    pub volatility: String,
    pub overlaps: String,
}

/// A cleaned row: parsed ratings, normalized region key, not yet geocoded.
#[derive(Debug, Clone)]
pub struct CleanedRow {
    pub name: String,
    pub country: String,
    /// Normalized region name used as the gazetteer lookup key.
    pub region_key: String,
    pub hazard_group: String,
    /// Ratings in [`DIMENSIONS`] order, each 1..=5.
    pub ratings: [u8; 5],
}

/// A row dropped during cleaning, with the offending field.
#[derive(Debug, Clone)]
pub struct DroppedRow {
    /// 0-based index into the raw input.
    pub row: usize,
    pub case_name: String,
    pub reason: String,
}

/// Outcome of the cleaning pass.
#[derive(Debug)]
pub struct CleanReport {
    pub kept: Vec<CleanedRow>,
    pub dropped: Vec<DroppedRow>,
}

/// The final cleaned case: geocoded, scored, and outlier-flagged.
/// This is the row schema of the Stage 1 output table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: u32,
    pub name: String,
    pub country: String,
    pub hazard_group: String,
    /// Centroid longitude of the case's administrative region, degrees.
    pub lon: f64,
    /// Centroid latitude, degrees.
    pub lat: f64,
    pub uncertainty: u8,
    pub interdependency: u8,
    pub multi_levels: u8,
    pub volatility: u8,
    pub overlaps: u8,
    pub total: u32,
    pub mean: f64,
    pub high_count: u32,
    pub outlier: bool,
}

impl CaseRecord {
    /// Assemble a record from its cleaned parts.
    pub fn from_parts(
        id: u32,
        row: &CleanedRow,
        lon: f64,
        lat: f64,
        scores: SummaryScores,
        outlier: bool,
    ) -> Self {
        let [uncertainty, interdependency, multi_levels, volatility, overlaps] = row.ratings;
        Self {
            id,
            name: row.name.clone(),
            country: row.country.clone(),
            hazard_group: row.hazard_group.clone(),
            lon,
            lat,
            uncertainty,
            interdependency,
            multi_levels,
            volatility,
            overlaps,
            total: scores.total,
            mean: scores.mean,
            high_count: scores.high_count,
            outlier,
        }
    }

    /// Ratings in [`DIMENSIONS`] order.
    pub fn ratings(&self) -> [u8; 5] {
        [
            self.uncertainty,
            self.interdependency,
            self.multi_levels,
            self.volatility,
            self.overlaps,
        ]
    }

    /// Check that every rating sits on the 1..=5 ordinal scale. The case
    /// table is a plain CSV that may have been hand-edited between stages.
    pub fn validate(&self) -> Result<()> {
        for (&name, &value) in DIMENSIONS.iter().zip(&self.ratings()) {
            if !(1..=5).contains(&value) {
                return Err(AnalysisError::InvalidRating {
                    dimension: name.to_string(),
                    value: i64::from(value),
                });
            }
        }
        Ok(())
    }

    /// Rating for a dimension by name.
    pub fn rating(&self, dimension: &str) -> Result<u8> {
        let idx = DIMENSIONS
            .iter()
            .position(|&d| d == dimension)
            .ok_or_else(|| AnalysisError::UnknownDimension { name: dimension.to_string() })?;
        Ok(self.ratings()[idx])
    }
}

/// Normalize a region or group name for use as a lookup key:
/// lowercase, trimmed, inner whitespace runs collapsed to single spaces.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Clean the raw survey rows. Rows with any missing or out-of-range rating
/// are moved to `dropped` with the first offending field named.
pub fn clean_survey(rows: &[RawSurveyRow]) -> CleanReport {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();

    'rows: for (idx, raw) in rows.iter().enumerate() {
        let fields = [
            ("uncertainty", &raw.uncertainty),
            ("interdependency", &raw.interdependency),
            ("multi_levels", &raw.multi_levels),
            ("volatility", &raw.volatility),
            ("overlaps", &raw.overlaps),
        ];

        let mut ratings = [0u8; 5];
        for (slot, (dimension, field)) in ratings.iter_mut().zip(fields) {
            match parse_rating(field) {
                Some(r) => *slot = r,
                None => {
                    dropped.push(DroppedRow {
                        row: idx,
                        case_name: raw.case_name.trim().to_string(),
                        reason: if field.trim().is_empty() {
                            format!("missing `{dimension}` rating")
                        } else {
                            format!("`{dimension}` rating `{}` is outside 1..=5", field.trim())
                        },
                    });
                    continue 'rows;
                }
            }
        }

        kept.push(CleanedRow {
            name: raw.case_name.trim().to_string(),
            country: raw.country.trim().to_string(),
            region_key: normalize_name(&raw.region),
            hazard_group: normalize_name(&raw.hazard_type),
            ratings,
        });
    }

    CleanReport { kept, dropped }
}

/// Parse a single rating field. Returns None for blanks, non-numeric text,
/// and values outside the 1..=5 ordinal scale.
fn parse_rating(field: &str) -> Option<u8> {
    let value: u8 = field.trim().parse().ok()?;
    (1..=5).contains(&value).then_some(value)
}

/// Build the five-column ratings table from cleaned cases.
pub fn dimension_table(cases: &[CaseRecord]) -> Result<DimensionTable> {
    if cases.is_empty() {
        return Err(AnalysisError::EmptyInput { context: "dimension table".to_string() });
    }
    let mut table = DimensionTable::new();
    for (idx, &name) in DIMENSIONS.iter().enumerate() {
        let values = cases.iter().map(|c| f64::from(c.ratings()[idx])).collect();
        table.push_column(name, values)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, ratings: [&str; 5]) -> RawSurveyRow {
        RawSurveyRow {
            case_name: name.to_string(),
            country: "Testland".to_string(),
            region: "  North   Province ".to_string(),
            hazard_type: "Flood".to_string(),
            uncertainty: ratings[0].to_string(),
            interdependency: ratings[1].to_string(),
            multi_levels: ratings[2].to_string(),
            volatility: ratings[3].to_string(),
            overlaps: ratings[4].to_string(),
        }
    }

    #[test]
    fn clean_keeps_valid_rows_and_normalizes_keys() {
        let report = clean_survey(&[raw("Case A", ["1", "5", "4", "2", "5"])]);
        assert_eq!(report.dropped.len(), 0);
        let row = &report.kept[0];
        assert_eq!(row.ratings, [1, 5, 4, 2, 5]);
        assert_eq!(row.region_key, "north province");
        assert_eq!(row.hazard_group, "flood");
    }

    #[test]
    fn clean_drops_missing_and_out_of_range_ratings() {
        let report = clean_survey(&[
            raw("Blank", ["", "3", "3", "3", "3"]),
            raw("Zero", ["3", "0", "3", "3", "3"]),
            raw("Six", ["3", "3", "6", "3", "3"]),
            raw("Text", ["3", "3", "3", "n/a", "3"]),
            raw("Good", ["3", "3", "3", "3", "4"]),
        ]);
        assert_eq!(report.kept.len(), 1);
        assert_eq!(report.kept[0].name, "Good");
        assert_eq!(report.dropped.len(), 4);
        assert!(report.dropped[0].reason.contains("missing `uncertainty`"));
        assert!(report.dropped[1].reason.contains("outside 1..=5"));
        assert!(report.dropped[3].reason.contains("volatility"));
    }

    #[test]
    fn dimension_table_has_five_aligned_columns() {
        let report = clean_survey(&[
            raw("A", ["1", "2", "3", "4", "5"]),
            raw("B", ["5", "4", "3", "2", "1"]),
        ]);
        let cases: Vec<CaseRecord> = report
            .kept
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let scores = crate::score::summarize(&row.ratings);
                CaseRecord::from_parts(i as u32, row, 0.0, 0.0, scores, false)
            })
            .collect();

        let table = dimension_table(&cases).unwrap();
        assert_eq!(table.n_columns(), 5);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column_by_name("uncertainty").unwrap(), &[1.0, 5.0]);
        assert_eq!(table.column_by_name("overlaps").unwrap(), &[5.0, 1.0]);
    }

    #[test]
    fn dimension_table_rejects_empty_input() {
        let err = dimension_table(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput { .. }));
    }

    #[test]
    fn case_record_lookup_and_validation() {
        let report = clean_survey(&[raw("A", ["1", "5", "4", "2", "5"])]);
        let scores = crate::score::summarize(&report.kept[0].ratings);
        let mut case = CaseRecord::from_parts(0, &report.kept[0], 12.5, -3.25, scores, false);

        assert_eq!(case.rating("multi_levels").unwrap(), 4);
        assert!(case.rating("severity").is_err());
        assert!(case.validate().is_ok());

        case.volatility = 9;
        let err = case.validate().unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidRating { ref dimension, value: 9 } if dimension == "volatility"
        ));
    }
}

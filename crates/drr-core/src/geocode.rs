//! Administrative-region centroid lookup.
//!
//! Cases are located by their administrative region, not by exact site
//! coordinates; each region maps to a single representative centroid taken
//! from a gazetteer table.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{AnalysisError, Result};
use crate::survey::normalize_name;

/// One gazetteer entry as read from the centroid table.
#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerRow {
    pub region: String,
    pub lon: f64,
    pub lat: f64,
}

/// A region centroid in geographic degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub lon: f64,
    pub lat: f64,
}

/// Region-name → centroid lookup. Keys are normalized with
/// [`normalize_name`], so lookups are insensitive to case and spacing.
#[derive(Debug)]
pub struct Gazetteer {
    entries: HashMap<String, Centroid>,
}

impl Gazetteer {
    pub fn from_rows(rows: &[GazetteerRow]) -> Self {
        let entries = rows
            .iter()
            .map(|r| (normalize_name(&r.region), Centroid { lon: r.lon, lat: r.lat }))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Centroid for an already-normalized region key, if present.
    pub fn lookup(&self, region_key: &str) -> Option<Centroid> {
        self.entries.get(region_key).copied()
    }

    /// Centroid for a case's region; a miss aborts the run with the
    /// offending region and case name.
    pub fn centroid_for(&self, region_key: &str, case: &str) -> Result<Centroid> {
        self.lookup(region_key).ok_or_else(|| AnalysisError::UnknownRegion {
            region: region_key.to_string(),
            case: case.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_rows(&[
            GazetteerRow { region: "North Province".to_string(), lon: 12.5, lat: -3.25 },
            GazetteerRow { region: "  Coastal   Zone ".to_string(), lon: 101.0, lat: 4.0 },
        ])
    }

    #[test]
    fn lookup_is_insensitive_to_case_and_spacing() {
        let g = gazetteer();
        assert_eq!(g.lookup("north province"), Some(Centroid { lon: 12.5, lat: -3.25 }));
        assert_eq!(g.lookup("coastal zone"), Some(Centroid { lon: 101.0, lat: 4.0 }));
        assert_eq!(g.lookup("unknown"), None);
    }

    #[test]
    fn centroid_for_reports_region_and_case() {
        let g = gazetteer();
        let err = g.centroid_for("atlantis", "Case X").unwrap_err();
        match err {
            AnalysisError::UnknownRegion { region, case } => {
                assert_eq!(region, "atlantis");
                assert_eq!(case, "Case X");
            }
            other => panic!("expected UnknownRegion, got {other:?}"),
        }
    }
}

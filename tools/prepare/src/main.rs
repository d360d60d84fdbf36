//! Stage 1 — survey cleaning and geocoding.
//!
//! Reads the raw survey export and the region-centroid gazetteer, drops rows
//! with missing or out-of-range ratings, joins each case to its
//! administrative-region centroid, derives summary scores, flags outliers on
//! the total score, and writes the cleaned case table consumed by Stages 2
//! and 3.
//!
//! Expected survey header: case_name, country, region, hazard_type,
//! uncertainty, interdependency, multi_levels, volatility, overlaps.
//! Expected gazetteer header: region, lon, lat.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use drr_core::geocode::{Gazetteer, GazetteerRow};
use drr_core::outlier::{flag_outliers, tukey_fences};
use drr_core::score::summarize;
use drr_core::survey::{clean_survey, CaseRecord, RawSurveyRow};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "prepare", about = "Clean and geocode the raw case-study survey table")]
struct Args {
    /// Raw survey CSV export.
    #[arg(short, long, default_value = "data/raw/survey.csv")]
    input: PathBuf,

    /// Region-centroid gazetteer CSV.
    #[arg(short, long, default_value = "data/raw/region_centroids.csv")]
    gazetteer: PathBuf,

    /// Cleaned case table output.
    #[arg(short, long, default_value = "data/cases.csv")]
    output: PathBuf,

    /// Run summary JSON sidecar.
    #[arg(long, default_value = "data/prepare_summary.json")]
    summary: PathBuf,
}

// ── Run summary ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RunSummary {
    rows_in: usize,
    rows_dropped: usize,
    cases_out: usize,
    outliers_flagged: usize,
    total_score_fence_lower: f64,
    total_score_fence_upper: f64,
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let raw_rows = read_survey(&args.input)?;
    println!("Read {} survey rows from {}", raw_rows.len(), args.input.display());

    let report = clean_survey(&raw_rows);
    for dropped in &report.dropped {
        eprintln!(
            "  dropping row {} ({}): {}",
            dropped.row, dropped.case_name, dropped.reason
        );
    }
    if report.kept.is_empty() {
        bail!("no usable rows left after cleaning {}", args.input.display());
    }

    let gazetteer = read_gazetteer(&args.gazetteer)?;
    println!("Loaded {} gazetteer centroids", gazetteer.len());

    // Geocode and score every kept row before fencing: the fences need the
    // full total-score sample.
    let mut located = Vec::with_capacity(report.kept.len());
    for row in &report.kept {
        let centroid = gazetteer.centroid_for(&row.region_key, &row.name)?;
        let scores = summarize(&row.ratings);
        located.push((row, centroid, scores));
    }

    let totals: Vec<f64> = located.iter().map(|(_, _, s)| f64::from(s.total)).collect();
    let fences = tukey_fences(&totals)?;
    let flags = flag_outliers(&totals)?;

    let cases: Vec<CaseRecord> = located
        .iter()
        .zip(&flags)
        .enumerate()
        .map(|(id, ((row, centroid, scores), &outlier))| {
            CaseRecord::from_parts(id as u32, row, centroid.lon, centroid.lat, *scores, outlier)
        })
        .collect();

    let outliers_flagged = flags.iter().filter(|&&f| f).count();
    for case in cases.iter().filter(|c| c.outlier) {
        println!(
            "  outlier: {} (total = {}, fences [{:.1}, {:.1}])",
            case.name, case.total, fences.lower, fences.upper
        );
    }

    write_cases(&args.output, &cases)?;
    println!("Wrote {} cases -> {}", cases.len(), args.output.display());

    let summary = RunSummary {
        rows_in: raw_rows.len(),
        rows_dropped: report.dropped.len(),
        cases_out: cases.len(),
        outliers_flagged,
        total_score_fence_lower: fences.lower,
        total_score_fence_upper: fences.upper,
    };
    write_summary(&args.summary, &summary)?;
    println!("Wrote run summary -> {}", args.summary.display());

    Ok(())
}

// ── IO ───────────────────────────────────────────────────────────────────────

fn read_survey(path: &Path) -> Result<Vec<RawSurveyRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open survey export {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: RawSurveyRow =
            record.with_context(|| format!("malformed survey row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_gazetteer(path: &Path) -> Result<Gazetteer> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open gazetteer {}", path.display()))?;
    let mut rows: Vec<GazetteerRow> = Vec::new();
    for record in reader.deserialize() {
        let row: GazetteerRow =
            record.with_context(|| format!("malformed gazetteer row in {}", path.display()))?;
        rows.push(row);
    }
    if rows.is_empty() {
        bail!("gazetteer {} is empty", path.display());
    }
    Ok(Gazetteer::from_rows(&rows))
}

fn write_cases(path: &Path, cases: &[CaseRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    for case in cases {
        writer.serialize(case)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

//! Stage 2 — map figure panels.
//!
//! Renders two SVG panels over a lon/lat frame from the cleaned case table:
//! panel A colours case centroids by hazard group, panel B sizes and colours
//! them by total complexity score. Outlier-flagged cases are drawn hollow.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use plotters::prelude::*;

use drr_core::survey::CaseRecord;

const PANEL_SIZE: (u32, u32) = (900, 600);

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "maps", about = "Render the two case-centroid map panels")]
struct Args {
    /// Cleaned case table from the prepare stage.
    #[arg(short, long, default_value = "data/cases.csv")]
    input: PathBuf,

    /// Output directory for the SVG panels.
    #[arg(short, long, default_value = "figures")]
    output_dir: PathBuf,
}

// ── Colour helpers ───────────────────────────────────────────────────────────

/// Fixed qualitative palette; hazard groups are assigned colours in sorted
/// group order so reruns are stable.
const GROUP_PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),  // blue
    RGBColor(255, 127, 14),  // orange
    RGBColor(44, 160, 44),   // green
    RGBColor(214, 39, 40),   // red
    RGBColor(148, 103, 189), // purple
    RGBColor(140, 86, 75),   // brown
];

fn group_color(idx: usize) -> RGBColor {
    GROUP_PALETTE[idx % GROUP_PALETTE.len()]
}

/// Total score 5–25 → light-to-dark red ramp.
fn score_color(total: u32) -> RGBColor {
    let t = ((total as f64 - 5.0) / 20.0).clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + t * (b - a)) as u8;
    RGBColor(lerp(254.0, 128.0), lerp(224.0, 0.0), lerp(210.0, 38.0))
}

/// Total score 5–25 → marker radius 3–9 px.
fn score_radius(total: u32) -> i32 {
    3 + ((total.saturating_sub(5)) * 6 / 20) as i32
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let cases = read_cases(&args.input)?;
    if cases.is_empty() {
        bail!("no cases in {}", args.input.display());
    }
    println!("Read {} cases from {}", cases.len(), args.input.display());

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("cannot create {}", args.output_dir.display()))?;

    let bounds = frame_bounds(&cases);

    let panel_a = args.output_dir.join("map_hazard_groups.svg");
    draw_group_panel(&panel_a, &cases, bounds.clone())?;
    println!("Wrote {}", panel_a.display());

    let panel_b = args.output_dir.join("map_complexity_scores.svg");
    draw_score_panel(&panel_b, &cases, bounds)?;
    println!("Wrote {}", panel_b.display());

    Ok(())
}

fn read_cases(path: &Path) -> Result<Vec<CaseRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open case table {}", path.display()))?;
    let mut cases = Vec::new();
    for record in reader.deserialize() {
        let case: CaseRecord =
            record.with_context(|| format!("malformed case row in {}", path.display()))?;
        cases.push(case);
    }
    Ok(cases)
}

/// Lon/lat frame covering all centroids with a 10% margin (at least 2°).
fn frame_bounds(cases: &[CaseRecord]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut lon = (f64::INFINITY, f64::NEG_INFINITY);
    let mut lat = (f64::INFINITY, f64::NEG_INFINITY);
    for c in cases {
        lon = (lon.0.min(c.lon), lon.1.max(c.lon));
        lat = (lat.0.min(c.lat), lat.1.max(c.lat));
    }
    let pad = |lo: f64, hi: f64| {
        let margin = (0.1 * (hi - lo)).max(2.0);
        (lo - margin)..(hi + margin)
    };
    (pad(lon.0, lon.1), pad(lat.0, lat.1))
}

// ── Panels ───────────────────────────────────────────────────────────────────

fn draw_group_panel(
    path: &Path,
    cases: &[CaseRecord],
    (lon_range, lat_range): (std::ops::Range<f64>, std::ops::Range<f64>),
) -> Result<()> {
    let root = SVGBackend::new(path, PANEL_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Case studies by hazard group", ("sans-serif", 22))
        .margin(18)
        .x_label_area_size(36)
        .y_label_area_size(46)
        .build_cartesian_2d(lon_range, lat_range)?;
    chart
        .configure_mesh()
        .x_desc("Longitude (deg)")
        .y_desc("Latitude (deg)")
        .draw()?;

    // One series per group so the legend picks up group names.
    let mut by_group: BTreeMap<&str, Vec<&CaseRecord>> = BTreeMap::new();
    for case in cases {
        by_group.entry(case.hazard_group.as_str()).or_default().push(case);
    }

    for (idx, (group, members)) in by_group.iter().enumerate() {
        let color = group_color(idx);
        chart
            .draw_series(members.iter().map(|c| {
                let style = if c.outlier { color.stroke_width(2) } else { color.filled() };
                Circle::new((c.lon, c.lat), 5, style)
            }))?
            .label(group.to_string())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_score_panel(
    path: &Path,
    cases: &[CaseRecord],
    (lon_range, lat_range): (std::ops::Range<f64>, std::ops::Range<f64>),
) -> Result<()> {
    let root = SVGBackend::new(path, PANEL_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Total complexity score (5\u{2013}25)", ("sans-serif", 22))
        .margin(18)
        .x_label_area_size(36)
        .y_label_area_size(46)
        .build_cartesian_2d(lon_range, lat_range)?;
    chart
        .configure_mesh()
        .x_desc("Longitude (deg)")
        .y_desc("Latitude (deg)")
        .draw()?;

    chart.draw_series(cases.iter().map(|c| {
        let color = score_color(c.total);
        let style = if c.outlier { color.stroke_width(2) } else { color.filled() };
        Circle::new((c.lon, c.lat), score_radius(c.total), style)
    }))?;

    root.present()?;
    Ok(())
}

//! Stage 3 — statistical analysis and figures.
//!
//! Reads the cleaned case table (outlier-flagged cases excluded), then:
//! descriptive statistics per dimension; Kruskal-Wallis across hazard
//! groups; pairwise Wilcoxon rank-sum with Bonferroni correction; Spearman
//! correlation matrices for the high-rating and low-rating views. Writes
//! delimited tables plus the bar-chart, heatmap, radar, and scatter figures.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rayon::prelude::*;
use serde::Serialize;

use drr_core::stats::{
    bonferroni, compute_correlation_matrix, describe, kruskal_wallis, rank_sum, CorrelationMatrix,
};
use drr_core::survey::{dimension_table, CaseRecord};
use drr_core::table::{DimensionTable, DIMENSIONS};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "analysis", about = "Run the descriptive and non-parametric analysis battery")]
struct Args {
    /// Cleaned case table from the prepare stage.
    #[arg(short, long, default_value = "data/cases.csv")]
    input: PathBuf,

    /// Output directory for delimited result tables.
    #[arg(short, long, default_value = "data/tables")]
    tables_dir: PathBuf,

    /// Output directory for SVG figures.
    #[arg(short, long, default_value = "figures")]
    figures_dir: PathBuf,
}

// ── Output rows ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DescriptiveRow {
    dimension: String,
    n: usize,
    mean: f64,
    std: f64,
    min: f64,
    q1: f64,
    median: f64,
    q3: f64,
    max: f64,
}

#[derive(Serialize)]
struct KruskalRow {
    dimension: String,
    h: f64,
    df: usize,
    p_value: f64,
}

#[derive(Serialize)]
struct WilcoxonRow {
    dimension: String,
    group_a: String,
    group_b: String,
    u: f64,
    z: f64,
    p_value: f64,
    p_bonferroni: f64,
}

/// Per-dimension results computed in one parallel pass.
struct DimensionResults {
    descriptive: DescriptiveRow,
    kruskal: Option<KruskalRow>,
    wilcoxon: Vec<WilcoxonRow>,
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let all_cases = read_cases(&args.input)?;
    let excluded = all_cases.iter().filter(|c| c.outlier).count();
    let cases: Vec<CaseRecord> = all_cases.into_iter().filter(|c| !c.outlier).collect();
    if cases.is_empty() {
        bail!("no non-outlier cases in {}", args.input.display());
    }
    println!("Analysing {} cases ({excluded} outlier-flagged excluded)", cases.len());

    fs::create_dir_all(&args.tables_dir)
        .with_context(|| format!("cannot create {}", args.tables_dir.display()))?;
    fs::create_dir_all(&args.figures_dir)
        .with_context(|| format!("cannot create {}", args.figures_dir.display()))?;

    let ratings = dimension_table(&cases)?;
    let groups = group_ratings(&cases);
    if groups.len() < 2 {
        eprintln!("  only {} hazard group(s): group tests will be skipped", groups.len());
    }

    // Descriptives and group tests are independent per dimension.
    let per_dimension: Vec<DimensionResults> = (0..DIMENSIONS.len())
        .into_par_iter()
        .map(|idx| analyse_dimension(idx, &ratings, &groups))
        .collect::<drr_core::Result<Vec<_>>>()?;

    write_table(
        &args.tables_dir.join("descriptives.csv"),
        per_dimension.iter().map(|d| &d.descriptive),
    )?;
    write_table(
        &args.tables_dir.join("kruskal_wallis.csv"),
        per_dimension.iter().filter_map(|d| d.kruskal.as_ref()),
    )?;
    write_table(
        &args.tables_dir.join("wilcoxon_pairwise.csv"),
        per_dimension.iter().flat_map(|d| &d.wilcoxon),
    )?;
    println!("Wrote result tables -> {}", args.tables_dir.display());

    // Each view gets its own independently built table and matrix.
    let high = compute_correlation_matrix(&ratings.high_view())?;
    let low = compute_correlation_matrix(&ratings.low_view())?;
    write_table(&args.tables_dir.join("spearman_high.csv"), high.flat_rows().iter())?;
    write_table(&args.tables_dir.join("spearman_low.csv"), low.flat_rows().iter())?;
    println!("Wrote correlation pair tables -> {}", args.tables_dir.display());

    let means: Vec<f64> = per_dimension.iter().map(|d| d.descriptive.mean).collect();
    draw_means_bar(&args.figures_dir.join("dimension_means_bar.svg"), &means)?;
    draw_heatmap(
        &args.figures_dir.join("spearman_high_heatmap.svg"),
        &high,
        "High-rating co-occurrence (Spearman)",
    )?;
    draw_heatmap(
        &args.figures_dir.join("spearman_low_heatmap.svg"),
        &low,
        "Low-rating co-occurrence (Spearman)",
    )?;
    draw_radar(&args.figures_dir.join("radar_hazard_groups.svg"), &groups)?;
    draw_scatter(&args.figures_dir.join("score_scatter.svg"), &cases)?;
    println!("Wrote figures -> {}", args.figures_dir.display());

    Ok(())
}

fn read_cases(path: &Path) -> Result<Vec<CaseRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open case table {}", path.display()))?;
    let mut cases = Vec::new();
    for record in reader.deserialize() {
        let case: CaseRecord =
            record.with_context(|| format!("malformed case row in {}", path.display()))?;
        case.validate()?;
        cases.push(case);
    }
    Ok(cases)
}

/// Hazard group → per-dimension rating vectors, in sorted group order.
fn group_ratings(cases: &[CaseRecord]) -> BTreeMap<String, Vec<[u8; 5]>> {
    let mut groups: BTreeMap<String, Vec<[u8; 5]>> = BTreeMap::new();
    for case in cases {
        groups.entry(case.hazard_group.clone()).or_default().push(case.ratings());
    }
    groups
}

fn analyse_dimension(
    idx: usize,
    ratings: &DimensionTable,
    groups: &BTreeMap<String, Vec<[u8; 5]>>,
) -> drr_core::Result<DimensionResults> {
    let dimension = DIMENSIONS[idx];
    let values = ratings.column(idx);

    let d = describe(values)?;
    let descriptive = DescriptiveRow {
        dimension: dimension.to_string(),
        n: d.n,
        mean: d.mean,
        std: d.std,
        min: d.min,
        q1: d.q1,
        median: d.median,
        q3: d.q3,
        max: d.max,
    };

    let group_values: Vec<(&String, Vec<f64>)> = groups
        .iter()
        .map(|(name, members)| {
            (name, members.iter().map(|r| f64::from(r[idx])).collect::<Vec<f64>>())
        })
        .collect();

    let mut kruskal = None;
    let mut wilcoxon = Vec::new();
    if group_values.len() >= 2 {
        let pooled: Vec<Vec<f64>> = group_values.iter().map(|(_, v)| v.clone()).collect();
        let kw = kruskal_wallis(&pooled)?;
        kruskal = Some(KruskalRow {
            dimension: dimension.to_string(),
            h: kw.h,
            df: kw.df,
            p_value: kw.p_value,
        });

        // One Bonferroni family per dimension: all group pairs.
        let k = group_values.len();
        let comparisons = k * (k - 1) / 2;
        for a in 0..k {
            for b in a + 1..k {
                let r = rank_sum(&group_values[a].1, &group_values[b].1)?;
                wilcoxon.push(WilcoxonRow {
                    dimension: dimension.to_string(),
                    group_a: group_values[a].0.clone(),
                    group_b: group_values[b].0.clone(),
                    u: r.u,
                    z: r.z,
                    p_value: r.p_value,
                    p_bonferroni: bonferroni(r.p_value, comparisons),
                });
            }
        }
    }

    Ok(DimensionResults { descriptive, kruskal, wilcoxon })
}

fn write_table<'a, R: Serialize + 'a>(
    path: &Path,
    rows: impl Iterator<Item = &'a R>,
) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("cannot create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

// ── Figures ──────────────────────────────────────────────────────────────────

const GROUP_PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// Coefficient in [-1, 1] → diverging blue-white-red.
fn coefficient_color(r: f64) -> RGBColor {
    let t = r.clamp(-1.0, 1.0);
    let lerp = |a: f64, b: f64, t: f64| (a + t * (b - a)) as u8;
    if t < 0.0 {
        RGBColor(lerp(255.0, 33.0, -t), lerp(255.0, 102.0, -t), lerp(255.0, 172.0, -t))
    } else {
        RGBColor(lerp(255.0, 178.0, t), lerp(255.0, 24.0, t), lerp(255.0, 43.0, t))
    }
}

fn label_style(size: u32, h: HPos, v: VPos) -> TextStyle<'static> {
    ("sans-serif", size).into_font().color(&BLACK).pos(Pos::new(h, v))
}

fn draw_means_bar(path: &Path, means: &[f64]) -> Result<()> {
    let root = SVGBackend::new(path, (720, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let d = means.len();
    let mut chart = ChartBuilder::on(&root)
        .caption("Mean rating per complexity dimension", ("sans-serif", 22))
        .margin(18)
        .x_label_area_size(8)
        .y_label_area_size(40)
        .build_cartesian_2d(-0.2f64..d as f64 + 0.2, -0.9f64..5.5f64)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc("Mean rating (1\u{2013}5)")
        .draw()?;

    let bar = RGBColor(31, 119, 180);
    chart.draw_series(means.iter().enumerate().map(|(i, &m)| {
        Rectangle::new([(i as f64 + 0.15, 0.0), (i as f64 + 0.85, m)], bar.filled())
    }))?;
    // Value labels above the bars, dimension names below the axis.
    chart.draw_series(means.iter().enumerate().map(|(i, &m)| {
        Text::new(format!("{m:.2}"), (i as f64 + 0.5, m + 0.15), label_style(14, HPos::Center, VPos::Bottom))
    }))?;
    chart.draw_series(DIMENSIONS.iter().enumerate().map(|(i, name)| {
        Text::new(name.to_string(), (i as f64 + 0.5, -0.25), label_style(13, HPos::Center, VPos::Top))
    }))?;

    root.present()?;
    Ok(())
}

fn draw_heatmap(path: &Path, matrix: &CorrelationMatrix, title: &str) -> Result<()> {
    let root = SVGBackend::new(path, (680, 620)).into_drawing_area();
    root.fill(&WHITE)?;

    let d = matrix.size();
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(18)
        .build_cartesian_2d(-2.4f64..d as f64, -1.6f64..d as f64)?;
    chart.configure_mesh().disable_mesh().disable_axes().draw()?;

    // Row i is drawn top-down so the matrix reads like the exported table.
    let row_y = |i: usize| (d - 1 - i) as f64;
    chart.draw_series((0..d).flat_map(|i| (0..d).map(move |j| (i, j))).map(|(i, j)| {
        let cell = matrix.get(i, j);
        Rectangle::new(
            [(j as f64, row_y(i)), (j as f64 + 1.0, row_y(i) + 1.0)],
            coefficient_color(cell.coefficient).filled(),
        )
    }))?;
    chart.draw_series((0..d).flat_map(|i| (0..d).map(move |j| (i, j))).map(|(i, j)| {
        Rectangle::new(
            [(j as f64, row_y(i)), (j as f64 + 1.0, row_y(i) + 1.0)],
            BLACK.mix(0.25).stroke_width(1),
        )
    }))?;

    for i in 0..d {
        for j in 0..d {
            let cell = matrix.get(i, j);
            let dark = cell.coefficient.abs() > 0.65;
            let color = if dark { &WHITE } else { &BLACK };
            let style = ("sans-serif", 15)
                .into_font()
                .color(color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            let x = j as f64 + 0.5;
            let y = row_y(i) + 0.5;
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.2}", cell.coefficient),
                (x, y + 0.12),
                style.clone(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                cell.bucket.stars().to_string(),
                (x, y - 0.22),
                style,
            )))?;
        }
    }

    // Dimension names: rows on the left, columns underneath.
    let names = matrix.dimensions();
    chart.draw_series(names.iter().enumerate().map(|(i, name)| {
        Text::new(name.clone(), (-0.12, row_y(i) + 0.5), label_style(13, HPos::Right, VPos::Center))
    }))?;
    chart.draw_series(names.iter().enumerate().map(|(j, name)| {
        Text::new(name.clone(), (j as f64 + 0.5, -0.15), label_style(13, HPos::Center, VPos::Top))
    }))?;

    // Bucket legend; the diagonal is fixed by construction.
    chart.draw_series(std::iter::once(Text::new(
        "*** p<=0.001    ** 0.001<p<=0.01    * 0.01<p<=0.05".to_string(),
        (d as f64 / 2.0, -1.0),
        label_style(13, HPos::Center, VPos::Top),
    )))?;

    root.present()?;
    Ok(())
}

fn draw_radar(path: &Path, groups: &BTreeMap<String, Vec<[u8; 5]>>) -> Result<()> {
    let root = SVGBackend::new(path, (640, 640)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Mean dimension profile per hazard group", ("sans-serif", 22))
        .margin(12)
        .build_cartesian_2d(-7.2f64..7.2f64, -6.8f64..6.8f64)?;
    chart.configure_mesh().disable_mesh().disable_axes().draw()?;

    let d = DIMENSIONS.len();
    let angle = |k: usize| -PI / 2.0 + 2.0 * PI * k as f64 / d as f64;
    let point = |k: usize, r: f64| (r * angle(k).cos(), r * angle(k).sin());

    // Rings at each rating level and one spoke per dimension.
    for level in 1..=5 {
        let ring: Vec<(f64, f64)> = (0..=60)
            .map(|s| {
                let a = 2.0 * PI * s as f64 / 60.0;
                (level as f64 * a.cos(), level as f64 * a.sin())
            })
            .collect();
        chart.draw_series(LineSeries::new(ring, BLACK.mix(0.15)))?;
    }
    for k in 0..d {
        chart.draw_series(LineSeries::new(vec![(0.0, 0.0), point(k, 5.2)], BLACK.mix(0.25)))?;
        let (x, y) = point(k, 5.8);
        chart.draw_series(std::iter::once(Text::new(
            DIMENSIONS[k].to_string(),
            (x, y),
            label_style(13, HPos::Center, VPos::Center),
        )))?;
    }

    for (idx, (group, members)) in groups.iter().enumerate() {
        let color = GROUP_PALETTE[idx % GROUP_PALETTE.len()];
        let mut means = [0.0f64; 5];
        for ratings in members {
            for (slot, &r) in means.iter_mut().zip(ratings) {
                *slot += f64::from(r);
            }
        }
        for slot in &mut means {
            *slot /= members.len() as f64;
        }

        let mut outline: Vec<(f64, f64)> =
            (0..d).map(|k| point(k, means[k])).collect();
        outline.push(outline[0]);
        chart.draw_series(std::iter::once(Polygon::new(outline.clone(), color.mix(0.12))))?;
        chart
            .draw_series(LineSeries::new(outline, color.stroke_width(2)))?
            .label(group.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_scatter(path: &Path, cases: &[CaseRecord]) -> Result<()> {
    let root = SVGBackend::new(path, (720, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Total score vs high-rated dimensions", ("sans-serif", 22))
        .margin(18)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(4.0f64..26.0f64, -0.5f64..5.5f64)?;
    chart
        .configure_mesh()
        .x_desc("Total complexity score (5\u{2013}25)")
        .y_desc("Dimensions rated high (>=4)")
        .draw()?;

    let color = RGBColor(31, 119, 180);
    chart.draw_series(cases.iter().map(|c| {
        Circle::new((f64::from(c.total), f64::from(c.high_count)), 4, color.mix(0.55).filled())
    }))?;

    root.present()?;
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use super::{Bar, CHART_SIZE, ChartSpec, Guide, Orientation, draw_chart, ensure_dir, save_png};
use crate::data::loader::{InputPolicy, load, read_value_lines};
use crate::stats::{Histogram, StdDevKind, Summary, summarize};

pub const BINS: usize = 50;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// One mesh quantity to histogram.
#[derive(Debug, Clone)]
pub struct HistogramJob<'a> {
    pub input: &'a Path,
    /// Quantity name used in titles and messages, e.g. "Edge Length".
    pub quantity: &'static str,
    pub title: &'static str,
    pub output: &'static str,
    pub decimals: usize,
    pub color: RGBColor,
}

/// Histograms of triangle edge lengths and vertex-centred areas.
///
/// Both inputs are optional; each one that is missing, unreadable or empty
/// is reported and skipped.
pub fn run(edges: &Path, areas: &Path, out_dir: &Path) -> Result<()> {
    let jobs = jobs(edges, areas);
    for (job, spec) in prepare(&jobs) {
        ensure_dir(out_dir)?;
        save_png(&out_dir.join(job.output), CHART_SIZE, |area| draw_chart(area, &spec))?;
    }
    Ok(())
}

fn jobs<'a>(edges: &'a Path, areas: &'a Path) -> [HistogramJob<'a>; 2] {
    [
        HistogramJob {
            input: edges,
            quantity: "Edge Length",
            title: "Histogram of Triangle Edge Lengths",
            output: "edge_lengths_histogram.png",
            decimals: 4,
            color: SKY_BLUE,
        },
        HistogramJob {
            input: areas,
            quantity: "Vertex-Centered Area",
            title: "Histogram of Vertex-Centered Areas",
            output: "vertex_areas_histogram.png",
            decimals: 6,
            color: LIGHT_GREEN,
        },
    ]
}

/// Load and summarise every job, printing its summary line. Jobs whose
/// input is missing, malformed or empty are reported and left out.
pub fn prepare<'j, 'a>(jobs: &'j [HistogramJob<'a>]) -> Vec<(&'j HistogramJob<'a>, ChartSpec)> {
    let mut ready = Vec::new();
    for job in jobs {
        let series = match load(job.input, InputPolicy::Optional, read_value_lines) {
            Ok(Some(series)) => series,
            Ok(None) => continue,
            Err(e) => {
                log::error!("{e}, skipping");
                continue;
            }
        };
        if series.is_empty() {
            println!("No {} data to plot", job.quantity.to_lowercase());
            continue;
        }

        let stats = summarize(&series.values, StdDevKind::Population)
            .and_then(|summary| Ok((summary, Histogram::build(&series.values, BINS)?)));
        let (summary, histogram) = match stats {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("{}: {e}, skipping", job.input.display());
                continue;
            }
        };
        println!(
            "{}: {} values, mean {:.prec$}, std {:.prec$} ({})",
            job.quantity,
            summary.count,
            summary.mean,
            summary.std_dev,
            summary.std_kind,
            prec = job.decimals
        );
        log::debug!(
            "{}: {BINS} bins over [{:.prec$}, {:.prec$}], tallest holds {}",
            job.quantity,
            histogram.start,
            histogram.end(),
            histogram.max_count(),
            prec = job.decimals
        );

        ready.push((job, chart(job, &summary, &histogram)));
    }
    ready
}

pub fn chart(job: &HistogramJob<'_>, summary: &Summary, histogram: &Histogram) -> ChartSpec {
    let p = job.decimals;
    let mut spec = ChartSpec::new(
        format!(
            "{} (Mean: {:.p$}, Standard Deviation: {:.p$})",
            job.title, summary.mean, summary.std_dev
        ),
        job.quantity,
        "Frequency",
    );
    spec.bar_color = Some(job.color);
    spec.bars = histogram
        .bins()
        .map(|(left, right, count)| Bar {
            left,
            right,
            height: count as f64,
        })
        .collect();
    spec.guides = guides(summary, p);
    spec
}

/// Vertical markers at the mean and one standard deviation either side.
pub fn guides(summary: &Summary, decimals: usize) -> Vec<Guide> {
    let p = decimals;
    let (mean, std) = (summary.mean, summary.std_dev);
    vec![
        Guide {
            label: Some(format!("Mean: {mean:.p$}")),
            orientation: Orientation::Vertical(mean),
            color: RED,
        },
        Guide {
            label: Some(format!("Mean - Std: {:.p$}", mean - std)),
            orientation: Orientation::Vertical(mean - std),
            color: ORANGE,
        },
        Guide {
            label: Some(format!("Mean + Std: {:.p$}", mean + std)),
            orientation: Orientation::Vertical(mean + std),
            color: ORANGE,
        },
    ]
}

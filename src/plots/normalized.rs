use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use super::{CHART_SIZE, ChartSpec, Series, draw_chart, save_png};
use crate::color::generate_palette;
use crate::data::loader::{ColumnRef, InputPolicy, load, read_csv_column};
use crate::data::model::NamedSeries;
use crate::stats::{StdDevKind, summarize};

pub const DEFAULT_OUTPUT: &str = "normalized_data_1000_samples.png";

/// Overlay the `value` column of each normalized CSV on one index plot.
///
/// Missing or unreadable files are reported and skipped; at least one
/// series must survive.
pub fn run(paths: &[PathBuf], output: &Path) -> Result<()> {
    let series = load_all(paths);
    if series.is_empty() {
        bail!("none of the {} input files could be plotted", paths.len());
    }

    let spec = chart(&series);
    save_png(output, CHART_SIZE, |area| draw_chart(area, &spec))
}

/// Every readable series, labelled by its position on the command line.
pub fn load_all(paths: &[PathBuf]) -> Vec<NamedSeries> {
    let mut series = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        let loaded = load(path, InputPolicy::Optional, |p| {
            read_csv_column(p, &ColumnRef::Name("value".into()), None)
        });
        let named = match loaded {
            Ok(Some(data)) => NamedSeries::from_file(i + 1, path, data),
            Ok(None) => continue,
            Err(e) => {
                log::error!("{e}, skipping");
                continue;
            }
        };
        match describe(i + 1, &named) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                log::error!("{}: {e}, skipping", path.display());
                continue;
            }
        }
        series.push(named);
    }
    series
}

/// Per-series summary block printed before plotting.
pub fn describe(ordinal: usize, named: &NamedSeries) -> Result<String> {
    let s = summarize(&named.series.values, StdDevKind::Population)?;
    Ok(format!(
        "Series {ordinal}: {} data points\n  Min: {:.4}, Max: {:.4}\n  Mean: {:.4}\n\n",
        s.count, s.min, s.max, s.mean
    ))
}

pub fn chart(series: &[NamedSeries]) -> ChartSpec {
    let mut title = String::from("Normalized 1-D Data (Min-Max to [0,1])");
    if let Some(first) = series.first() {
        if series.iter().all(|s| s.series.len() == first.series.len()) {
            title.push_str(&format!(" - {} Samples Each", first.series.len()));
        }
    }

    let mut spec = ChartSpec::new(title, "Index", "Normalized Value");
    let colors = generate_palette(series.len());
    for (named, color) in series.iter().zip(colors) {
        spec.series
            .push(Series::line(named.label.clone(), named.series.indexed(), color));
    }
    spec
}

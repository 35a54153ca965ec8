//! Column statistics and min-max normalization for a single CSV file.
//!
//! Writes two files next to the input: a fixed-format text report and a
//! one-column CSV (`value`) that `plot-normalized` reads back.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::loader::{ColumnRef, InputPolicy, load, read_csv_column, read_text};
use crate::data::model::DataSeries;
use crate::error::{DataError, StatsError};
use crate::stats::{StdDevKind, min_max_normalize, summarize};

/// Number of keys a parameter file must define.
const PARAM_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorParams {
    pub data_file: PathBuf,
    /// Data rows to read; `None` reads everything.
    pub num_lines: Option<usize>,
    pub column: ColumnRef,
}

impl ProcessorParams {
    /// Parse a `key = value` file defining `data_file`, `num_lines` and
    /// `column`. Whitespace is ignored, unknown keys are skipped and
    /// `num_lines = 0` means all rows.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let text = read_text(path)?;
        let bad = |reason: String| DataError::Params {
            path: path.to_path_buf(),
            reason,
        };

        let mut data_file = None;
        let mut num_lines = None;
        let mut column = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key: String = key.chars().filter(|c| !c.is_whitespace()).collect();
            let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            match key.as_str() {
                "data_file" => data_file = Some(PathBuf::from(value)),
                "num_lines" => {
                    let n: usize = value
                        .parse()
                        .map_err(|_| bad(format!("num_lines '{value}' is not a count")))?;
                    num_lines = Some(n);
                }
                "column" => {
                    let c: usize = value
                        .parse()
                        .map_err(|_| bad(format!("column '{value}' is not an index")))?;
                    column = Some(c);
                }
                other => log::debug!("{}: ignoring key '{other}'", path.display()),
            }
        }

        match (data_file, num_lines, column) {
            (Some(data_file), Some(num_lines), Some(column)) => Ok(ProcessorParams {
                data_file,
                num_lines: (num_lines > 0).then_some(num_lines),
                column: ColumnRef::Index(column),
            }),
            (d, n, c) => {
                let found = [d.is_some(), n.is_some(), c.is_some()]
                    .iter()
                    .filter(|&&set| set)
                    .count();
                Err(bad(format!(
                    "expected {PARAM_COUNT} parameters (data_file, num_lines, column), found {found}"
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeReport {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub std_kind: StdDevKind,
    pub normalized: Vec<f64>,
}

/// Mean, sample standard deviation and min-max normalized values.
pub fn process(series: &DataSeries) -> Result<NormalizeReport, StatsError> {
    let summary = summarize(&series.values, StdDevKind::Sample)?;
    let normalized = min_max_normalize(&series.values)?;
    Ok(NormalizeReport {
        count: summary.count,
        mean: summary.mean,
        std_dev: summary.std_dev,
        std_kind: summary.std_kind,
        normalized,
    })
}

impl NormalizeReport {
    /// Fixed two-decimal text layout.
    pub fn write_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Number of parameters read: {PARAM_COUNT}")?;
        writeln!(out, "Mean: {:.2}", self.mean)?;
        writeln!(out, "Standard deviation: {:.2}", self.std_dev)?;
        writeln!(out, "Normalized data:")?;
        for v in &self.normalized {
            writeln!(out, "{v:.2}")?;
        }
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["value"])?;
        for v in &self.normalized {
            writer.write_record([v.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// `<stem>_normalized.txt` and `<stem>_normalized.csv` beside `data_file`.
pub fn output_paths(data_file: &Path) -> (PathBuf, PathBuf) {
    let stem = data_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    let dir = data_file.parent().unwrap_or_else(|| Path::new(""));
    (
        dir.join(format!("{stem}_normalized.txt")),
        dir.join(format!("{stem}_normalized.csv")),
    )
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub fn run(params: &ProcessorParams) -> Result<()> {
    let path = &params.data_file;
    let series = load(path, InputPolicy::Required, |p| {
        read_csv_column(p, &params.column, params.num_lines)
    })?
    .with_context(|| format!("{} was not loaded", path.display()))?;

    let report = process(&series).with_context(|| format!("processing {}", path.display()))?;
    let (txt_path, csv_path) = output_paths(path);

    let mut txt = BufWriter::new(
        File::create(&txt_path).with_context(|| format!("creating {}", txt_path.display()))?,
    );
    report
        .write_text(&mut txt)
        .and_then(|_| txt.flush())
        .with_context(|| format!("writing {}", txt_path.display()))?;

    let csv_file =
        File::create(&csv_path).with_context(|| format!("creating {}", csv_path.display()))?;
    report
        .write_csv(BufWriter::new(csv_file))
        .with_context(|| format!("writing {}", csv_path.display()))?;

    println!(
        "Processed {}: {} points, Mean: {:.2}, Std: {:.2} ({})",
        path.display(),
        report.count,
        report.mean,
        report.std_dev,
        report.std_kind
    );
    log::info!("wrote {} and {}", txt_path.display(), csv_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::{scratch_dir, scratch_file};

    #[test]
    fn test_params_file() {
        let path = scratch_file(
            "params.txt",
            "data_file = AbaloneAge.csv\n num_lines=1000\ncolumn = 0\nextra=1\n",
        );
        let params = ProcessorParams::from_file(&path).unwrap();
        assert_eq!(params.data_file, PathBuf::from("AbaloneAge.csv"));
        assert_eq!(params.num_lines, Some(1000));
        assert_eq!(params.column, ColumnRef::Index(0));
    }

    #[test]
    fn test_params_zero_lines_means_all() {
        let path = scratch_file("params_all.txt", "data_file=a.csv\nnum_lines=0\ncolumn=2\n");
        assert_eq!(ProcessorParams::from_file(&path).unwrap().num_lines, None);
    }

    #[test]
    fn test_params_incomplete() {
        let path = scratch_file("params_short.txt", "data_file=a.csv\n");
        let err = ProcessorParams::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_report_text_layout() {
        let report = process(&DataSeries::new(vec![2.0, 8.0, 5.0])).unwrap();
        assert_eq!(report.std_kind, StdDevKind::Sample);
        assert_eq!(report.std_kind.to_string(), "sample");
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Number of parameters read: 3\nMean: 5.00\nStandard deviation: 3.00\n\
             Normalized data:\n0.00\n1.00\n0.50\n"
        );
    }

    #[test]
    fn test_constant_column_is_reported() {
        assert_eq!(
            process(&DataSeries::new(vec![5.0, 5.0, 5.0])),
            Err(StatsError::Degenerate(5.0))
        );
    }

    #[test]
    fn test_output_paths() {
        let (txt, csv) = output_paths(Path::new("data/StressLevel.csv"));
        assert_eq!(txt, PathBuf::from("data/StressLevel_normalized.txt"));
        assert_eq!(csv, PathBuf::from("data/StressLevel_normalized.csv"));
    }

    #[test]
    fn test_run_writes_both_outputs() {
        let dir = scratch_dir("normalize-run");
        let data = dir.join("levels.csv");
        std::fs::write(&data, "level,other\n1,9\n3,9\n5,9\n7,9\n").unwrap();
        let params = ProcessorParams {
            data_file: data.clone(),
            num_lines: Some(3),
            column: ColumnRef::Name("level".into()),
        };
        run(&params).unwrap();

        let csv = std::fs::read_to_string(dir.join("levels_normalized.csv")).unwrap();
        assert_eq!(csv, "value\n0\n0.5\n1\n");
        let txt = std::fs::read_to_string(dir.join("levels_normalized.txt")).unwrap();
        assert!(txt.starts_with("Number of parameters read: 3\nMean: 3.00\n"));
    }
}

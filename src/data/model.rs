use std::fmt;
use std::path::Path;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DataSeries – one numeric column
// ---------------------------------------------------------------------------

/// An ordered run of samples read from a single column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSeries {
    pub values: Vec<f64>,
}

impl DataSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(index, value)` pairs for plotting over the sample index.
    pub fn indexed(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// NamedSeries – a series with its legend label
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub label: String,
    pub series: DataSeries,
}

impl NamedSeries {
    /// Label a series after its source file: `Series {ordinal} ({stem})`.
    ///
    /// A trailing `_normalized` is dropped from the stem so
    /// `abalone_normalized.csv` reads as `abalone`.
    pub fn from_file(ordinal: usize, path: &Path, series: DataSeries) -> Self {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("data");
        let stem = stem.strip_suffix("_normalized").unwrap_or(stem);
        Self {
            label: format!("Series {ordinal} ({stem})"),
            series,
        }
    }
}

// ---------------------------------------------------------------------------
// NumericTable – whitespace-delimited columns
// ---------------------------------------------------------------------------

/// Column-major numeric table; every column has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    pub columns: Vec<Vec<f64>>,
}

impl NumericTable {
    pub fn column(&self, idx: usize) -> Option<&[f64]> {
        self.columns.get(idx).map(|c| c.as_slice())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }
}

// ---------------------------------------------------------------------------
// Benchmark results
// ---------------------------------------------------------------------------

/// One line printed by a benchmark executable:
/// `Metric,N,Threads|Processes,Min,Avg,StdDev`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkRecord {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "N")]
    pub n: u64,
    #[serde(rename = "Threads", alias = "Processes")]
    pub workers: u32,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Avg")]
    pub avg: f64,
    #[serde(rename = "StdDev")]
    pub std_dev: f64,
}

/// Name of the worker-count column in a result header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum WorkerColumn {
    #[default]
    Threads,
    Processes,
}

impl WorkerColumn {
    pub fn header(&self) -> String {
        format!("Metric,N,{self},Min,Avg,StdDev")
    }
}

impl fmt::Display for WorkerColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerColumn::Threads => write!(f, "Threads"),
            WorkerColumn::Processes => write!(f, "Processes"),
        }
    }
}

/// Records from one aggregated results file, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    pub worker_column: WorkerColumn,
    pub records: Vec<BenchmarkRecord>,
}

// ---------------------------------------------------------------------------
// Root-finder convergence rows
// ---------------------------------------------------------------------------

/// `function,type,iteration,root,residual`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConvergenceRow {
    pub function: String,
    #[serde(rename = "type")]
    pub precision: String,
    pub iteration: u32,
    pub root: f64,
    pub residual: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_strips_normalized_suffix() {
        let s = NamedSeries::from_file(2, Path::new("out/stress_normalized.csv"), DataSeries::default());
        assert_eq!(s.label, "Series 2 (stress)");
    }

    #[test]
    fn test_worker_column_header() {
        assert_eq!(WorkerColumn::Threads.header(), "Metric,N,Threads,Min,Avg,StdDev");
        assert_eq!(
            WorkerColumn::Processes.header(),
            "Metric,N,Processes,Min,Avg,StdDev"
        );
    }
}

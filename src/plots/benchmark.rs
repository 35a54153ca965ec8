use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use plotters::prelude::*;

use super::{CHART_SIZE, ChartSpec, Scale, Series, draw_chart, save_png};
use crate::color::ColorMap;
use crate::data::filter::MatchCase;
use crate::data::loader::{InputPolicy, load, read_result_table};
use crate::data::model::ResultTable;
use crate::stats::speedup;

/// The three aggregated result files written by the sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchPlot {
    /// Serial layouts: time vs matrix size.
    MatrixSize,
    /// Shared-memory variants: speedup vs threads.
    Speedup,
    /// MPI distributions: time vs processes.
    Processes,
}

impl BenchPlot {
    pub const ALL: [BenchPlot; 3] = [BenchPlot::MatrixSize, BenchPlot::Speedup, BenchPlot::Processes];

    pub fn from_task(task: u8) -> Option<Self> {
        match task {
            1 => Some(BenchPlot::MatrixSize),
            2 => Some(BenchPlot::Speedup),
            3 => Some(BenchPlot::Processes),
            _ => None,
        }
    }

    pub fn input(&self) -> &'static str {
        match self {
            BenchPlot::MatrixSize => "task1_results.csv",
            BenchPlot::Speedup => "task2_results.csv",
            BenchPlot::Processes => "task3_results.csv",
        }
    }

    pub fn output(&self) -> &'static str {
        match self {
            BenchPlot::MatrixSize => "plot1_execution_time_vs_matrix_size.png",
            BenchPlot::Speedup => "plot2_speedup_vs_threads.png",
            BenchPlot::Processes => "plot3_execution_time_vs_processes.png",
        }
    }

    pub fn chart(&self, table: &ResultTable) -> Result<ChartSpec> {
        match self {
            BenchPlot::MatrixSize => Ok(matrix_size_chart(table)),
            BenchPlot::Speedup => speedup_chart(table),
            BenchPlot::Processes => Ok(processes_chart(table)),
        }
    }
}

/// Render the requested plots from `dir`.
///
/// With an explicit selection the input file is required; when plotting
/// everything, each missing file is reported and the rest still render.
pub fn run(selection: Option<BenchPlot>, dir: &Path) -> Result<()> {
    let (plots, policy) = match selection {
        Some(plot) => (vec![plot], InputPolicy::Required),
        None => (BenchPlot::ALL.to_vec(), InputPolicy::Optional),
    };

    let mut failed = 0;
    for plot in plots {
        if let Err(e) = render(plot, dir, policy) {
            if policy == InputPolicy::Required {
                return Err(e);
            }
            log::error!("{e:#}");
            failed += 1;
        }
    }
    if failed > 0 {
        log::warn!("{failed} plot(s) could not be produced");
    }
    Ok(())
}

fn render(plot: BenchPlot, dir: &Path, policy: InputPolicy) -> Result<()> {
    let input = dir.join(plot.input());
    let Some(table) = load(&input, policy, read_result_table)
        .with_context(|| format!("run the sweep that writes {} first", plot.input()))?
    else {
        return Ok(());
    };
    let spec = plot.chart(&table)?;
    save_png(&dir.join(plot.output()), CHART_SIZE, |area| draw_chart(area, &spec))
}

// ---------------------------------------------------------------------------
// Plot 1: execution time vs matrix size (log-log)
// ---------------------------------------------------------------------------

pub fn matrix_size_chart(table: &ResultTable) -> ChartSpec {
    let versions = ["original", "row_major", "col_major"];
    let colors = ColorMap::new(&versions);

    let mut spec = ChartSpec::new(
        "Plot 1: Execution Time vs. Matrix Size (Log-Log)",
        "Matrix Size (N)",
        "Execution Time (ms)",
    );
    spec.x_scale = Scale::Log;
    spec.y_scale = Scale::Log;
    spec.legend_upper_left = true;

    for version in versions {
        let points: Vec<(f64, f64)> = table
            .matching(version, MatchCase::Insensitive)
            .iter()
            .map(|r| (r.n as f64, r.min))
            .collect();
        if !points.is_empty() {
            spec.series
                .push(Series::line(version, points, colors.color_for(version)).with_markers());
        }
    }
    spec
}

// ---------------------------------------------------------------------------
// Plot 2: speedup vs threads
// ---------------------------------------------------------------------------

/// Metric substring and legend label for each shared-memory variant.
pub const SPEEDUP_GROUPS: [(&str, &str); 4] = [
    ("OpenMP_static", "OpenMP Static"),
    ("OpenMP_dynamic", "OpenMP Dynamic"),
    ("OpenMP_guided", "OpenMP Guided"),
    ("Threads", "std::thread (Atomic)"),
];

/// `(threads, T1 / TP)` for every record of a variant.
pub fn speedup_points(table: &ResultTable, needle: &str) -> Result<Vec<(f64, f64)>> {
    let t1 = table
        .single_worker_time(needle)
        .ok_or_else(|| anyhow!("T1 (single thread) data not found for {needle}"))?;
    table
        .matching(needle, MatchCase::Sensitive)
        .iter()
        .map(|r| -> Result<(f64, f64)> {
            let s = speedup(t1, r.min)
                .with_context(|| format!("{} at {} threads", r.metric, r.workers))?;
            Ok((f64::from(r.workers), s))
        })
        .collect()
}

pub fn speedup_chart(table: &ResultTable) -> Result<ChartSpec> {
    let labels: Vec<&str> = SPEEDUP_GROUPS.iter().map(|(_, label)| *label).collect();
    let colors = ColorMap::new(&labels);

    let mut spec = ChartSpec::new(
        "Plot 2: Speedup vs. Number of Threads",
        "Number of Threads",
        "Speedup (T1/TP)",
    );
    spec.legend_upper_left = true;

    for (needle, label) in SPEEDUP_GROUPS {
        let points = speedup_points(table, needle)?;
        spec.series
            .push(Series::line(label, points, colors.color_for(label)).with_markers());
    }

    let ideal: Vec<(f64, f64)> = table
        .worker_counts(SPEEDUP_GROUPS[0].0)
        .into_iter()
        .map(|t| (f64::from(t), f64::from(t)))
        .collect();
    if ideal.is_empty() {
        bail!("no {} records to derive thread counts from", SPEEDUP_GROUPS[0].0);
    }
    spec.series
        .push(Series::line("Ideal Speedup", ideal, BLACK).dashed());
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Plot 3: execution time vs processes
// ---------------------------------------------------------------------------

pub fn processes_chart(table: &ResultTable) -> ChartSpec {
    let groups = [
        ("contiguous", "MPI Contiguous Scatter (Unbalanced)"),
        ("cyclic", "MPI Optimized Strategy (Balanced)"),
    ];
    let colors = ColorMap::new(&groups.map(|(_, label)| label));

    let mut spec = ChartSpec::new(
        format!("Plot 3: Execution Time vs. Number of {}", table.worker_column),
        format!("Number of {}", table.worker_column),
        "Execution Time (ms)",
    );
    for (needle, label) in groups {
        let points: Vec<(f64, f64)> = table
            .matching(needle, MatchCase::Sensitive)
            .iter()
            .map(|r| (f64::from(r.workers), r.min))
            .collect();
        if !points.is_empty() {
            spec.series
                .push(Series::line(label, points, colors.color_for(label)).with_markers());
        }
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{BenchmarkRecord, WorkerColumn};

    fn record(metric: &str, n: u64, workers: u32, min: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            metric: metric.to_string(),
            n,
            workers,
            min,
            avg: min * 1.1,
            std_dev: 0.1,
        }
    }

    fn threads_table() -> ResultTable {
        let mut records = Vec::new();
        for (metric, t1) in [
            ("OpenMP_static", 100.0),
            ("OpenMP_dynamic", 120.0),
            ("OpenMP_guided", 110.0),
            ("Threads", 90.0),
        ] {
            for threads in [1u32, 2, 4] {
                records.push(record(metric, 8192, threads, t1 / threads as f64));
            }
        }
        ResultTable {
            worker_column: WorkerColumn::Threads,
            records,
        }
    }

    #[test]
    fn test_speedup_points() {
        let points = speedup_points(&threads_table(), "OpenMP_dynamic").unwrap();
        assert_eq!(points, vec![(1.0, 1.0), (2.0, 2.0), (4.0, 4.0)]);
    }

    #[test]
    fn test_speedup_chart_adds_ideal_line() {
        let spec = speedup_chart(&threads_table()).unwrap();
        assert_eq!(spec.series.len(), 5);
        let ideal = spec.series.last().unwrap();
        assert_eq!(ideal.label.as_deref(), Some("Ideal Speedup"));
        assert_eq!(ideal.points, vec![(1.0, 1.0), (2.0, 2.0), (4.0, 4.0)]);
    }

    #[test]
    fn test_missing_single_thread_time_is_an_error() {
        let mut table = threads_table();
        table
            .records
            .retain(|r| !(r.metric == "OpenMP_guided" && r.workers == 1));
        let err = speedup_chart(&table).unwrap_err();
        assert!(err.to_string().contains("T1"));
    }

    #[test]
    fn test_matrix_size_chart_is_log_log() {
        let table = ResultTable {
            worker_column: WorkerColumn::Threads,
            records: vec![
                record("Serial_original", 256, 1, 0.5),
                record("Serial_row_major", 256, 1, 0.3),
                record("Serial_original", 512, 1, 2.1),
            ],
        };
        let spec = matrix_size_chart(&table);
        assert_eq!((spec.x_scale, spec.y_scale), (Scale::Log, Scale::Log));
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].points, vec![(256.0, 0.5), (512.0, 2.1)]);
    }

    #[test]
    fn test_processes_chart_groups_by_strategy() {
        let table = ResultTable {
            worker_column: WorkerColumn::Processes,
            records: vec![
                record("MPI_contiguous", 8192, 2, 40.0),
                record("MPI_cyclic", 8192, 2, 30.0),
                record("MPI_contiguous", 8192, 4, 25.0),
            ],
        };
        let spec = processes_chart(&table);
        assert_eq!(spec.x_desc, "Number of Processes");
        assert_eq!(spec.title, "Plot 3: Execution Time vs. Number of Processes");
        assert_eq!(spec.series[0].points, vec![(2.0, 40.0), (4.0, 25.0)]);
        assert_eq!(spec.series[1].points, vec![(2.0, 30.0)]);
    }

    #[test]
    fn test_explicit_task_requires_its_file() {
        let dir = std::env::temp_dir().join("statplot-bench-missing");
        assert!(run(Some(BenchPlot::Speedup), &dir).is_err());
        assert!(run(None, &dir).is_ok());
    }
}

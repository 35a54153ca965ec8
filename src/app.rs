use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::data::loader::ColumnRef;
use crate::normalize::{self, ProcessorParams};
use crate::plots::{self, benchmark::BenchPlot};
use crate::runner::{self, AxisValue, ProcessInvoker, SweepPlan, plans};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "statplot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mean, sample std and min-max normalization of one CSV column.
    Normalize(NormalizeArgs),

    /// Overlay normalized series on one chart.
    PlotNormalized {
        /// Normalized CSV files (column `value`).
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = plots::normalized::DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// Position and x-y path plots for 2D and 3D trajectories.
    Trajectory {
        #[arg(long, default_value = "traject_2d.txt")]
        file_2d: PathBuf,
        #[arg(long, default_value = "traject_3d.txt")]
        file_3d: PathBuf,
        #[arg(long, default_value = "images")]
        out_dir: PathBuf,
    },

    /// Root and residual convergence of Newton and secant iterations.
    Convergence {
        #[arg(long, default_value = "newton_plot.csv")]
        newton: PathBuf,
        #[arg(long, default_value = "secant_plot.csv")]
        secant: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Histograms of mesh edge lengths and vertex areas.
    Histogram {
        #[arg(long, default_value = "edge_lengths.txt")]
        edges: PathBuf,
        #[arg(long, default_value = "vertex_areas.txt")]
        areas: PathBuf,
        #[arg(long, default_value = "images")]
        out_dir: PathBuf,
    },

    /// A polynomial and its derivatives over x.
    Polynomial {
        #[arg(long, default_value = "polynomial_evaluation.txt")]
        input: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Plots from the aggregated benchmark result files.
    BenchPlot {
        /// 1: time vs size, 2: speedup vs threads, 3: time vs processes.
        /// All three when omitted.
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        task: Option<u8>,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Run a benchmark executable over a parameter sweep.
    Sweep(SweepArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["csv", "params"])))]
pub struct NormalizeArgs {
    /// CSV file with a header row.
    pub csv: Option<PathBuf>,

    /// key=value file naming data_file, num_lines and column.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Zero-based column index.
    #[arg(long, default_value_t = 0, conflicts_with_all = ["column_name", "params"])]
    pub column: usize,

    #[arg(long, conflicts_with = "params")]
    pub column_name: Option<String>,

    /// Data rows to read; 0 reads all.
    #[arg(long, default_value_t = 1000, conflicts_with = "params")]
    pub lines: usize,
}

impl NormalizeArgs {
    pub fn to_params(&self) -> Result<ProcessorParams> {
        if let Some(path) = &self.params {
            return Ok(ProcessorParams::from_file(path)?);
        }
        let data_file = self
            .csv
            .clone()
            .ok_or_else(|| anyhow!("no input CSV given"))?;
        let column = match &self.column_name {
            Some(name) => ColumnRef::Name(name.clone()),
            None => ColumnRef::Index(self.column),
        };
        Ok(ProcessorParams {
            data_file,
            num_lines: (self.lines > 0).then_some(self.lines),
            column,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuiltinPlan {
    /// Serial layouts vs matrix size.
    Task1,
    /// OpenMP schedules and std::thread vs thread count.
    Task2,
    /// MPI distributions vs process count.
    Task3,
}

impl BuiltinPlan {
    pub fn plan(self) -> SweepPlan {
        match self {
            BuiltinPlan::Task1 => plans::task1(),
            BuiltinPlan::Task2 => plans::task2(),
            BuiltinPlan::Task3 => plans::task3(),
        }
    }
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["builtin", "plan"])))]
pub struct SweepArgs {
    pub builtin: Option<BuiltinPlan>,

    /// JSON sweep plan.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Replace an axis, e.g. `--set threads=1,2,4`.
    #[arg(long = "set", value_name = "AXIS=V1,V2")]
    pub overrides: Vec<String>,

    /// Write rows here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Split `name=v1,v2` into an axis name and its values.
pub fn parse_override(spec: &str) -> Result<(String, Vec<AxisValue>)> {
    let (name, values) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("'{spec}' is not of the form AXIS=V1,V2"))?;
    let values: Vec<AxisValue> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            if let Ok(i) = v.parse::<i64>() {
                AxisValue::Int(i)
            } else if let Ok(f) = v.parse::<f64>() {
                AxisValue::Float(f)
            } else {
                AxisValue::Text(v.to_string())
            }
        })
        .collect();
    if values.is_empty() {
        return Err(anyhow!("'{spec}' lists no values"));
    }
    Ok((name.trim().to_string(), values))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Normalize(args) => normalize::run(&args.to_params()?),
        Command::PlotNormalized { files, output } => plots::normalized::run(&files, &output),
        Command::Trajectory {
            file_2d,
            file_3d,
            out_dir,
        } => plots::trajectory::run(&file_2d, &file_3d, &out_dir),
        Command::Convergence {
            newton,
            secant,
            out_dir,
        } => plots::convergence::run(&newton, &secant, &out_dir),
        Command::Histogram {
            edges,
            areas,
            out_dir,
        } => plots::histogram::run(&edges, &areas, &out_dir),
        Command::Polynomial { input, out_dir } => plots::polynomial::run(&input, &out_dir),
        Command::BenchPlot { task, dir } => {
            plots::benchmark::run(task.and_then(BenchPlot::from_task), &dir)
        }
        Command::Sweep(args) => sweep(&args),
    }
}

fn sweep(args: &SweepArgs) -> Result<()> {
    let mut plan = match (&args.plan, args.builtin) {
        (Some(path), _) => plans::load_plan(path)?,
        (None, Some(builtin)) => builtin.plan(),
        (None, None) => return Err(anyhow!("no sweep plan given")),
    };
    for spec in &args.overrides {
        let (name, values) = parse_override(spec)?;
        plan.override_axis(&name, &values)?;
    }
    plan.validate()?;
    plan.check_required()?;
    log::info!("sweep: {} invocations", plan.total_invocations());

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    let outcome = runner::run_sweep(&plan, &ProcessInvoker, &mut *out)
        .context("writing sweep results")?;

    if let Some(path) = &args.output {
        log::info!("wrote {} rows to {}", outcome.rows, path.display());
    }
    if !outcome.failures.is_empty() {
        log::warn!(
            "{} of {} invocations failed",
            outcome.failures.len(),
            outcome.rows + outcome.failures.len()
        );
        for failure in &outcome.failures {
            log::warn!("  {}: {}", failure.command, failure.error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plot_normalized_needs_two_files() {
        assert!(Cli::try_parse_from(["statplot", "plot-normalized", "a.csv"]).is_err());
        let cli = Cli::try_parse_from(["statplot", "plot-normalized", "a.csv", "b.csv"]).unwrap();
        match cli.command {
            Command::PlotNormalized { files, output } => {
                assert_eq!(files.len(), 2);
                assert_eq!(output, PathBuf::from("normalized_data_1000_samples.png"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let cli = Cli::try_parse_from(["statplot", "normalize", "AbaloneAge.csv"]).unwrap();
        let Command::Normalize(args) = cli.command else {
            panic!("expected normalize");
        };
        let params = args.to_params().unwrap();
        assert_eq!(params.num_lines, Some(1000));
        assert_eq!(params.column, ColumnRef::Index(0));

        let cli = Cli::try_parse_from([
            "statplot", "normalize", "s.csv", "--column-name", "Stress", "--lines", "0",
        ])
        .unwrap();
        let Command::Normalize(args) = cli.command else {
            panic!("expected normalize");
        };
        let params = args.to_params().unwrap();
        assert_eq!(params.num_lines, None);
        assert_eq!(params.column, ColumnRef::Name("Stress".into()));
    }

    #[test]
    fn test_normalize_needs_a_source() {
        assert!(Cli::try_parse_from(["statplot", "normalize"]).is_err());
    }

    #[test]
    fn test_bench_plot_task_range() {
        assert!(Cli::try_parse_from(["statplot", "bench-plot", "4"]).is_err());
        let cli = Cli::try_parse_from(["statplot", "bench-plot", "2"]).unwrap();
        assert!(matches!(cli.command, Command::BenchPlot { task: Some(2), .. }));
    }

    #[test]
    fn test_sweep_builtin_or_plan() {
        assert!(Cli::try_parse_from(["statplot", "sweep"]).is_err());
        let cli = Cli::try_parse_from(["statplot", "sweep", "task3", "--set", "processes=2,4"])
            .unwrap();
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.builtin, Some(BuiltinPlan::Task3));
        assert_eq!(args.overrides, vec!["processes=2,4"]);
    }

    #[test]
    fn test_parse_override() {
        let (name, values) = parse_override("threads = 1, 2,static,0.5").unwrap();
        assert_eq!(name, "threads");
        assert_eq!(
            values,
            vec![
                AxisValue::Int(1),
                AxisValue::Int(2),
                AxisValue::Text("static".into()),
                AxisValue::Float(0.5),
            ]
        );
        assert!(parse_override("threads").is_err());
        assert!(parse_override("threads=").is_err());
    }
}

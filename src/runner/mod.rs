//! Parameter sweeps over external benchmark executables.
//!
//! A [`SweepPlan`] is a list of stages; each stage invokes one program once
//! per combination of its axes, the first axis varying slowest. Every
//! invocation must print one CSV line; those lines are collected under the
//! plan's header.
//!
//! ```text
//!  SweepPlan ──► Stage::combinations ──► Invoker::invoke ──► CSV line
//!                                               │
//!                                               └─ failure: logged, sweep continues
//! ```

pub mod plans;
pub mod process;

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use serde::Deserialize;

use crate::data::model::WorkerColumn;
use crate::error::RunError;

pub use process::ProcessInvoker;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A single axis value; JSON plans may use numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Int(v) => write!(f, "{v}"),
            AxisValue::Float(v) => write!(f, "{v}"),
            AxisValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AxisValue {
    fn from(s: &str) -> Self {
        AxisValue::Text(s.to_string())
    }
}

impl From<i64> for AxisValue {
    fn from(v: i64) -> Self {
        AxisValue::Int(v)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Axis {
    pub name: String,
    pub values: Vec<AxisValue>,
}

impl Axis {
    pub fn new<V: Into<AxisValue>>(name: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            name: name.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// One program swept over the Cartesian product of its axes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stage {
    pub program: String,
    /// Argument templates; `{axis}` is replaced by that axis' value.
    pub args: Vec<String>,
    pub axes: Vec<Axis>,
    /// Files that must exist before the sweep starts.
    #[serde(default)]
    pub requires: Vec<PathBuf>,
}

/// One point of a sweep: `(axis name, value)` in axis order.
pub type Combination<'a> = Vec<(&'a str, String)>;

impl Stage {
    /// Every combination of axis values, first axis outermost.
    pub fn combinations(&self) -> Vec<Combination<'_>> {
        let mut combos: Vec<Combination<'_>> = vec![Vec::new()];
        for axis in &self.axes {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    axis.values.iter().map(move |v| {
                        let mut combo = prefix.clone();
                        combo.push((axis.name.as_str(), v.to_string()));
                        combo
                    })
                })
                .collect();
        }
        combos
    }

    /// Substitute a combination into the argument templates.
    pub fn expand_args(&self, combo: &Combination<'_>) -> Vec<String> {
        self.args
            .iter()
            .map(|template| {
                combo.iter().fold(template.clone(), |arg, (name, value)| {
                    arg.replace(&format!("{{{name}}}"), value)
                })
            })
            .collect()
    }

    /// Reject templates naming an axis the stage does not define.
    pub fn validate(&self) -> Result<(), RunError> {
        for template in &self.args {
            let mut rest = template.as_str();
            while let Some(open) = rest.find('{') {
                let Some(close) = rest[open..].find('}') else {
                    break;
                };
                let name = &rest[open + 1..open + close];
                if !self.axes.iter().any(|a| a.name == name) {
                    return Err(RunError::Plan(format!(
                        "{}: argument '{template}' refers to unknown axis '{name}'",
                        self.program
                    )));
                }
                rest = &rest[open + close + 1..];
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SweepPlan {
    #[serde(default)]
    pub worker_column: WorkerColumn,
    pub stages: Vec<Stage>,
}

impl SweepPlan {
    /// Replace the values of axis `name` in every stage that has it.
    pub fn override_axis(&mut self, name: &str, values: &[AxisValue]) -> Result<(), RunError> {
        let mut found = false;
        for axis in self.stages.iter_mut().flat_map(|s| s.axes.iter_mut()) {
            if axis.name == name {
                axis.values = values.to_vec();
                found = true;
            }
        }
        if found {
            Ok(())
        } else {
            Err(RunError::Plan(format!("no axis named '{name}'")))
        }
    }

    pub fn validate(&self) -> Result<(), RunError> {
        self.stages.iter().try_for_each(Stage::validate)
    }

    /// Presence check for every required executable; nothing is run.
    pub fn check_required(&self) -> Result<(), RunError> {
        for path in self.stages.iter().flat_map(|s| &s.requires) {
            if !path.exists() {
                return Err(RunError::MissingExecutable { path: path.clone() });
            }
        }
        Ok(())
    }

    pub fn total_invocations(&self) -> usize {
        self.stages
            .iter()
            .map(|s| s.axes.iter().map(|a| a.values.len()).product::<usize>())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Runs one external command and returns its standard output.
pub trait Invoker {
    fn invoke(&self, program: &str, args: &[String]) -> Result<String, RunError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub command: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub rows: usize,
    pub failures: Vec<Failure>,
}

/// Run every combination of every stage once, in order, writing the header
/// and one line per successful invocation to `out`.
///
/// A failed invocation is logged and recorded; it never stops the sweep.
pub fn run_sweep<I, W>(plan: &SweepPlan, invoker: &I, out: &mut W) -> std::io::Result<SweepOutcome>
where
    I: Invoker + ?Sized,
    W: Write + ?Sized,
{
    writeln!(out, "{}", plan.worker_column.header())?;
    let mut outcome = SweepOutcome::default();

    for stage in &plan.stages {
        for combo in stage.combinations() {
            let args = stage.expand_args(&combo);
            let command = command_line(&stage.program, &args);

            let result = invoker.invoke(&stage.program, &args).and_then(|stdout| {
                result_line(&stdout, &command).ok_or_else(|| RunError::NoOutput {
                    command: command.clone(),
                })
            });

            match result {
                Ok(line) => {
                    writeln!(out, "{line}")?;
                    outcome.rows += 1;
                }
                Err(e) => {
                    log::error!("Error running {command}: {e}");
                    outcome.failures.push(Failure {
                        command,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    out.flush()?;
    Ok(outcome)
}

/// The last non-empty line of a program's output; earlier lines are
/// diagnostics and are dropped with a warning.
fn result_line(stdout: &str, command: &str) -> Option<String> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let (last, earlier) = lines.split_last()?;
    if !earlier.is_empty() {
        log::warn!(
            "{command} printed {} lines; keeping only the last",
            earlier.len() + 1
        );
    }
    Some(last.to_string())
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every call; fails when any argument equals `fail_on`.
    struct StubInvoker {
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl StubInvoker {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                fail_on,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Invoker for StubInvoker {
        fn invoke(&self, program: &str, args: &[String]) -> Result<String, RunError> {
            self.calls.borrow_mut().push(args.to_vec());
            if self.fail_on.is_some_and(|f| args.iter().any(|a| a == f)) {
                return Err(RunError::Failed {
                    command: command_line(program, args),
                    status: "exit status: 1".into(),
                    stderr: String::new(),
                });
            }
            Ok(format!("Metric_{},{},1,1.0,1.0,0.0\n", args[1], args[0]))
        }
    }

    fn two_by_two() -> SweepPlan {
        SweepPlan {
            worker_column: WorkerColumn::Threads,
            stages: vec![Stage {
                program: "./bench.x".into(),
                args: vec!["{n}".into(), "{version}".into()],
                axes: vec![
                    Axis::new("n", [256i64, 512]),
                    Axis::new("version", ["row", "col"]),
                ],
                requires: vec![],
            }],
        }
    }

    #[test]
    fn test_combinations_outer_axis_first() {
        let plan = two_by_two();
        let combos: Vec<Vec<String>> = plan.stages[0]
            .combinations()
            .iter()
            .map(|c| plan.stages[0].expand_args(c))
            .collect();
        assert_eq!(
            combos,
            vec![
                vec!["256", "row"],
                vec!["256", "col"],
                vec!["512", "row"],
                vec!["512", "col"],
            ]
        );
        assert_eq!(plan.total_invocations(), 4);
    }

    #[test]
    fn test_sweep_all_succeed() {
        let stub = StubInvoker::new(None);
        let mut out = Vec::new();
        let outcome = run_sweep(&two_by_two(), &stub, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Metric,N,Threads,Min,Avg,StdDev");
        assert_eq!(lines[1], "Metric_row,256,1,1.0,1.0,0.0");
        assert_eq!(lines[4], "Metric_col,512,1,1.0,1.0,0.0");
        assert_eq!(outcome.rows, 4);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_sweep_continues_after_failure() {
        let stub = StubInvoker::new(Some("512"));
        let mut plan = two_by_two();
        plan.override_axis("version", &[AxisValue::from("row")]).unwrap();
        let mut out = Vec::new();
        let outcome = run_sweep(&plan, &stub, &mut out).unwrap();

        assert_eq!(outcome.rows, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].command, "./bench.x 512 row");
        // every combination was attempted exactly once
        assert_eq!(stub.calls.borrow().len(), 2);

        let failing_one = StubInvoker::new(Some("col"));
        let mut out = Vec::new();
        let outcome = run_sweep(&two_by_two(), &failing_one, &mut out).unwrap();
        assert_eq!(outcome.rows, 2);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_only_last_output_line_is_kept() {
        struct Chatty;
        impl Invoker for Chatty {
            fn invoke(&self, _: &str, args: &[String]) -> Result<String, RunError> {
                Ok(format!(
                    "warming up\n\nSerial_{},{},1,1.0,1.0,0.0\n\n",
                    args[1], args[0]
                ))
            }
        }
        let mut out = Vec::new();
        let outcome = run_sweep(&two_by_two(), &Chatty, &mut out).unwrap();
        assert_eq!(outcome.rows, 4);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert_eq!(text.lines().nth(1), Some("Serial_row,256,1,1.0,1.0,0.0"));
        assert!(!text.contains("warming up"));
    }

    #[test]
    fn test_empty_output_counts_as_failure() {
        struct Silent;
        impl Invoker for Silent {
            fn invoke(&self, _: &str, _: &[String]) -> Result<String, RunError> {
                Ok("  \n".into())
            }
        }
        let mut out = Vec::new();
        let outcome = run_sweep(&two_by_two(), &Silent, &mut out).unwrap();
        assert_eq!(outcome.rows, 0);
        assert_eq!(outcome.failures.len(), 4);
        assert!(outcome.failures[0].error.contains("printed nothing"));
    }

    #[test]
    fn test_validate_unknown_axis() {
        let mut plan = two_by_two();
        plan.stages[0].args.push("{threads}".into());
        assert!(matches!(plan.validate(), Err(RunError::Plan(_))));
        assert!(two_by_two().validate().is_ok());
    }

    #[test]
    fn test_override_axis() {
        let mut plan = two_by_two();
        plan.override_axis("n", &[AxisValue::Int(1024)]).unwrap();
        assert_eq!(plan.total_invocations(), 2);
        assert!(plan.override_axis("threads", &[]).is_err());
    }

    #[test]
    fn test_missing_required_executable() {
        let mut plan = two_by_two();
        plan.stages[0].requires = vec![PathBuf::from("./definitely-not-built.x")];
        let err = plan.check_required().unwrap_err();
        assert_eq!(
            err.to_string(),
            "./definitely-not-built.x not found. Please run 'make' first."
        );
    }

    #[test]
    fn test_json_plan_accepts_numbers_and_strings() {
        let plan: SweepPlan = serde_json::from_str(
            r#"{
                "worker_column": "Processes",
                "stages": [{
                    "program": "mpirun",
                    "args": ["-np", "{p}", "./mv_mpi.x", "{strategy}"],
                    "axes": [
                        {"name": "p", "values": [2, 4]},
                        {"name": "strategy", "values": ["cyclic"]}
                    ]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(plan.worker_column, WorkerColumn::Processes);
        let stage = &plan.stages[0];
        let combos = stage.combinations();
        assert_eq!(
            stage.expand_args(&combos[1]),
            vec!["-np", "4", "./mv_mpi.x", "cyclic"]
        );
        assert!(stage.requires.is_empty());
    }
}

//! Built-in sweeps for the matrix-vector benchmarks, and JSON plan loading.

use std::path::{Path, PathBuf};

use super::{Axis, Stage, SweepPlan};
use crate::data::loader::read_text;
use crate::data::model::WorkerColumn;
use crate::error::DataError;

/// Fixed problem size for the parallel sweeps.
pub const PARALLEL_N: i64 = 8192;

/// Serial layouts over N = 2^8 ..= 2^14.
pub fn task1() -> SweepPlan {
    SweepPlan {
        worker_column: WorkerColumn::Threads,
        stages: vec![Stage {
            program: "./mv_serial.x".into(),
            args: vec!["{n}".into(), "{version}".into()],
            axes: vec![
                Axis::new("n", (8..=14).map(|e| 1i64 << e)),
                Axis::new("version", ["original", "row_major", "col_major"]),
            ],
            requires: vec![PathBuf::from("mv_serial.x")],
        }],
    }
}

/// OpenMP schedules, then `std::thread`, over the same thread counts.
pub fn task2() -> SweepPlan {
    let threads = [1i64, 2, 4, 8, 16, 32];
    SweepPlan {
        worker_column: WorkerColumn::Threads,
        stages: vec![
            Stage {
                program: "./mv_openmp.x".into(),
                args: vec![
                    PARALLEL_N.to_string(),
                    "{threads}".into(),
                    "{schedule}".into(),
                    "1".into(),
                ],
                axes: vec![
                    Axis::new("threads", threads),
                    Axis::new("schedule", ["static", "dynamic", "guided"]),
                ],
                requires: vec![PathBuf::from("mv_openmp.x"), PathBuf::from("mv_threads.x")],
            },
            Stage {
                program: "./mv_threads.x".into(),
                args: vec![PARALLEL_N.to_string(), "{threads}".into()],
                axes: vec![Axis::new("threads", threads)],
                requires: vec![],
            },
        ],
    }
}

/// MPI row distributions over process counts.
pub fn task3() -> SweepPlan {
    SweepPlan {
        worker_column: WorkerColumn::Processes,
        stages: vec![Stage {
            program: "mpirun".into(),
            args: vec![
                "-np".into(),
                "{processes}".into(),
                "./mv_mpi.x".into(),
                PARALLEL_N.to_string(),
                "{strategy}".into(),
            ],
            axes: vec![
                Axis::new("processes", [2i64, 4, 8, 16]),
                Axis::new("strategy", ["contiguous", "cyclic"]),
            ],
            requires: vec![PathBuf::from("mv_mpi.x")],
        }],
    }
}

/// Read a [`SweepPlan`] from a JSON file.
pub fn load_plan(path: &Path) -> Result<SweepPlan, DataError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| DataError::Params {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

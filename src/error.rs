use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Failures while reading an input file produced by an external program.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{} not found", path.display())]
    Missing { path: PathBuf },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}, line {line}: '{token}' is not a finite number", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("{}: missing column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}, line {line}: expected {expected} columns, found {found}", path.display())]
    Ragged {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{}: no data rows", path.display())]
    Empty { path: PathBuf },

    #[error("{}: {reason}", path.display())]
    Params { path: PathBuf, reason: String },
}

// ---------------------------------------------------------------------------
// Statistics errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("statistics of an empty series are undefined")]
    Empty,

    #[error("sample standard deviation needs at least 2 values, got {0}")]
    TooFewSamples(usize),

    /// min == max, so min-max scaling would divide by zero.
    #[error("degenerate input: every value equals {0}")]
    Degenerate(f64),

    #[error("speedup undefined for a parallel time of {0}")]
    NonPositiveTime(f64),

    /// A finite input produced an infinite or NaN result.
    #[error("result is not finite ({0}); values are too large to combine")]
    NonFinite(f64),
}

// ---------------------------------------------------------------------------
// External process errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} printed nothing")]
    NoOutput { command: String },

    #[error("{} not found. Please run 'make' first.", path.display())]
    MissingExecutable { path: PathBuf },

    #[error("invalid sweep plan: {0}")]
    Plan(String),
}

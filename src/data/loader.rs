use std::path::{Path, PathBuf};

use super::model::{
    BenchmarkRecord, ConvergenceRow, DataSeries, NumericTable, ResultTable, WorkerColumn,
};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Missing-file policy
// ---------------------------------------------------------------------------

/// What a command does when an input file is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPolicy {
    /// Absence fails the command.
    Required,
    /// Absence is logged and the input is skipped.
    Optional,
}

/// Apply `policy` to `path`, then hand existing files to `read`.
///
/// Only absence is governed by the policy; a file that exists but cannot be
/// parsed is always an error for the caller to report.
pub fn load<T, F>(path: &Path, policy: InputPolicy, read: F) -> Result<Option<T>, DataError>
where
    F: FnOnce(&Path) -> Result<T, DataError>,
{
    if !path.exists() {
        return match policy {
            InputPolicy::Required => Err(DataError::Missing {
                path: path.to_path_buf(),
            }),
            InputPolicy::Optional => {
                log::warn!("{} does not exist, skipping", path.display());
                Ok(None)
            }
        };
    }
    let value = read(path)?;
    log::debug!("loaded {}", path.display());
    Ok(Some(value))
}

// ---------------------------------------------------------------------------
// CSV column
// ---------------------------------------------------------------------------

/// Which CSV column to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

/// Read one numeric column of a headed CSV file, stopping after `limit`
/// data rows when given.
pub fn read_csv_column(
    path: &Path,
    column: &ColumnRef,
    limit: Option<usize>,
) -> Result<DataSeries, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();

    let idx = match column {
        ColumnRef::Index(i) if *i < headers.len() => *i,
        ColumnRef::Index(i) => {
            return Err(DataError::MissingColumn {
                path: path.to_path_buf(),
                column: format!("#{i}"),
            })
        }
        ColumnRef::Name(name) => headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn {
                path: path.to_path_buf(),
                column: name.clone(),
            })?,
    };

    let mut values = Vec::new();
    for result in reader.records() {
        if limit.is_some_and(|l| values.len() >= l) {
            break;
        }
        let record = result.map_err(|source| csv_error(path, source))?;
        let line = record_line(&record);
        let token = record.get(idx).unwrap_or("");
        values.push(parse_finite(path, line, token)?);
    }

    if values.is_empty() {
        return Err(DataError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(DataSeries::new(values))
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// One value per line; blank lines are ignored. An empty file yields an
/// empty series so callers can report "no data" themselves.
pub fn read_value_lines(path: &Path) -> Result<DataSeries, DataError> {
    let text = read_text(path)?;
    let mut values = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        values.push(parse_finite(path, i + 1, token)?);
    }
    Ok(DataSeries::new(values))
}

/// Whitespace-delimited table with exactly one header line to skip.
///
/// All rows must share the width of the first row, which must be at least
/// `min_columns`.
pub fn read_numeric_table(path: &Path, min_columns: usize) -> Result<NumericTable, DataError> {
    let text = read_text(path)?;
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (i, line) in text.lines().enumerate().skip(1) {
        let line_no = i + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if columns.is_empty() {
            if tokens.len() < min_columns {
                return Err(DataError::Ragged {
                    path: path.to_path_buf(),
                    line: line_no,
                    expected: min_columns,
                    found: tokens.len(),
                });
            }
            columns = vec![Vec::new(); tokens.len()];
        } else if tokens.len() != columns.len() {
            return Err(DataError::Ragged {
                path: path.to_path_buf(),
                line: line_no,
                expected: columns.len(),
                found: tokens.len(),
            });
        }

        for (col, token) in columns.iter_mut().zip(tokens) {
            col.push(parse_finite(path, line_no, token)?);
        }
    }

    if columns.is_empty() {
        return Err(DataError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(NumericTable { columns })
}

// ---------------------------------------------------------------------------
// Typed CSV files
// ---------------------------------------------------------------------------

/// Aggregated benchmark output with a `Threads` or `Processes` column.
pub fn read_result_table(path: &Path) -> Result<ResultTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    let worker_column = if headers.iter().any(|h| h == "Processes") {
        WorkerColumn::Processes
    } else {
        WorkerColumn::Threads
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(|source| csv_error(path, source))?;
        let line = record_line(&raw);
        let record: BenchmarkRecord = raw
            .deserialize(Some(&headers))
            .map_err(|source| csv_error(path, source))?;
        ensure_finite(path, line, &[record.min, record.avg, record.std_dev])?;
        records.push(record);
    }

    Ok(ResultTable {
        worker_column,
        records,
    })
}

/// Per-iteration root-finder output.
pub fn read_convergence(path: &Path) -> Result<Vec<ConvergenceRow>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(|source| csv_error(path, source))?;
        let line = record_line(&raw);
        let row: ConvergenceRow = raw
            .deserialize(Some(&headers))
            .map_err(|source| csv_error(path, source))?;
        ensure_finite(path, line, &[row.root, row.residual])?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(DataError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}

// -- helpers --

pub(crate) fn read_text(path: &Path) -> Result<String, DataError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DataError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            DataError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn record_line(record: &csv::StringRecord) -> usize {
    record.position().map_or(0, |p| p.line() as usize)
}

/// Serde accepts `NaN` and `inf`; every reader rejects them.
fn ensure_finite(path: &Path, line: usize, values: &[f64]) -> Result<(), DataError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(DataError::Malformed {
            path: path.to_path_buf(),
            line,
            token: bad.to_string(),
        }),
        None => Ok(()),
    }
}

fn parse_finite(path: &Path, line: usize, token: &str) -> Result<f64, DataError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DataError::Malformed {
            path: PathBuf::from(path),
            line,
            token: token.to_string(),
        }),
    }
}

fn csv_error(path: &Path, source: csv::Error) -> DataError {
    if let csv::ErrorKind::Io(io) = source.kind() {
        if io.kind() == std::io::ErrorKind::NotFound {
            return DataError::Missing {
                path: path.to_path_buf(),
            };
        }
    }
    DataError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

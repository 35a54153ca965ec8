//! Descriptive statistics over a single series.
//!
//! Every entry point rejects empty input instead of returning zeros or NaN,
//! so nothing undefined can leak into a written report or chart.

use std::fmt;

use crate::error::StatsError;

// ---------------------------------------------------------------------------
// Standard deviation convention
// ---------------------------------------------------------------------------

/// Divisor used for the variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdDevKind {
    /// Divide by `n` (ddof = 0).
    Population,
    /// Divide by `n - 1` (ddof = 1). Needs at least two values.
    Sample,
}

impl fmt::Display for StdDevKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdDevKind::Population => write!(f, "population"),
            StdDevKind::Sample => write!(f, "sample"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub std_kind: StdDevKind,
}

/// Compute count, extremes, mean and standard deviation.
///
/// The mean and squared deviations are accumulated incrementally (Welford),
/// so large finite values do not overflow an intermediate sum. A result that
/// still is not finite is rejected.
pub fn summarize(values: &[f64], kind: StdDevKind) -> Result<Summary, StatsError> {
    let (min, max) = min_max(values)?;
    let n = values.len();

    let divisor = match kind {
        StdDevKind::Population => n as f64,
        StdDevKind::Sample => {
            if n < 2 {
                return Err(StatsError::TooFewSamples(n));
            }
            (n - 1) as f64
        }
    };

    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (k, &v) in values.iter().enumerate() {
        let delta = v - mean;
        mean += delta / (k + 1) as f64;
        m2 += delta * (v - mean);
    }
    let std_dev = (m2 / divisor).sqrt();

    for result in [mean, std_dev] {
        if !result.is_finite() {
            return Err(StatsError::NonFinite(result));
        }
    }

    Ok(Summary {
        count: n,
        min,
        max,
        mean,
        std_dev,
        std_kind: kind,
    })
}

/// Smallest and largest value of a non-empty series.
pub fn min_max(values: &[f64]) -> Result<(f64, f64), StatsError> {
    if values.is_empty() {
        return Err(StatsError::Empty);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((min, max))
}

// ---------------------------------------------------------------------------
// Derived series
// ---------------------------------------------------------------------------

/// Min-max scaling into `[0, 1]`: `(x - min) / (max - min)`.
///
/// When `max - min` overflows, both sides are halved first.
pub fn min_max_normalize(values: &[f64]) -> Result<Vec<f64>, StatsError> {
    let (min, max) = min_max(values)?;
    if max == min {
        return Err(StatsError::Degenerate(min));
    }
    let range = max - min;
    let scaled: Vec<f64> = if range.is_finite() {
        values.iter().map(|&v| (v - min) / range).collect()
    } else {
        let half_range = max / 2.0 - min / 2.0;
        values.iter().map(|&v| (v / 2.0 - min / 2.0) / half_range).collect()
    };

    match scaled.iter().find(|v| !v.is_finite()) {
        Some(&bad) => Err(StatsError::NonFinite(bad)),
        None => Ok(scaled),
    }
}

/// Parallel speedup `T1 / TP`.
pub fn speedup(t1: f64, tp: f64) -> Result<f64, StatsError> {
    if !t1.is_finite() {
        return Err(StatsError::NonFinite(t1));
    }
    if !tp.is_finite() {
        return Err(StatsError::NonFinite(tp));
    }
    if tp <= 0.0 {
        return Err(StatsError::NonPositiveTime(tp));
    }
    let s = t1 / tp;
    if !s.is_finite() {
        return Err(StatsError::NonFinite(s));
    }
    Ok(s)
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Fixed-count, equal-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Left edge of the first bin.
    pub start: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` buckets spanning `[min, max]`.
    ///
    /// The maximum lands in the last bin. A constant series gets a single
    /// populated bucket of unit width centred on the value.
    pub fn build(values: &[f64], bins: usize) -> Result<Self, StatsError> {
        let (min, max) = min_max(values)?;
        let bins = bins.max(1);

        if max == min {
            let mut counts = vec![0; bins];
            counts[0] = values.len();
            return Ok(Histogram {
                start: min - 0.5,
                bin_width: 1.0,
                counts,
            });
        }

        let bin_width = (max - min) / bins as f64;
        let mut counts = vec![0; bins];
        for &v in values {
            let idx = (((v - min) / bin_width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Ok(Histogram {
            start: min,
            bin_width,
            counts,
        })
    }

    /// `(left, right, count)` for each bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts.iter().enumerate().map(move |(i, &c)| {
            let left = self.start + i as f64 * self.bin_width;
            (left, left + self.bin_width, c)
        })
    }

    pub fn end(&self) -> f64 {
        self.start + self.bin_width * self.counts.len() as f64
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

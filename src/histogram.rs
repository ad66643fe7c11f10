//! Histogram binning for waiting-time samples
//!
//! Bin count comes from the Freedman-Diaconis rule unless the caller
//! supplies one explicitly. Edges span exactly the observed data; buckets
//! are left-inclusive with a right-inclusive final bucket so the maximum
//! sample is always counted.

use thiserror::Error;

/// Unit of the histogram axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
    Minutes,
}

impl Unit {
    /// Convert a wait in seconds into this unit
    pub fn convert(&self, seconds: f64) -> f64 {
        match self {
            Unit::Seconds => seconds,
            Unit::Minutes => seconds / 60.0,
        }
    }

    /// X-axis label for plots
    pub fn axis_label(&self) -> &'static str {
        match self {
            Unit::Seconds => "Waiting time [seconds]",
            Unit::Minutes => "Waiting time [minutes]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Seconds => "seconds",
            Unit::Minutes => "minutes",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistogramError {
    #[error("--bins must be a positive integer")]
    InvalidBinCount,

    #[error("cannot build a histogram from zero samples")]
    NoSamples,
}

/// Binned waiting-time distribution
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSpec {
    /// `bins + 1` ascending, evenly spaced edges spanning the samples
    pub edges: Vec<f64>,
    /// Samples per bucket; sums to the sample count
    pub counts: Vec<u64>,
    pub unit: Unit,
}

impl HistogramSpec {
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }
}

/// Value at quantile `p` over sorted data, with linear interpolation
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = (sorted.len() - 1) as f64 * p;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = idx - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Freedman-Diaconis bin count for a sample set
///
/// Bin width is `2 * IQR / n^(1/3)`; the count is the data range divided
/// by that width, rounded up. A single sample or a zero IQR selects one
/// bin rather than falling back to another rule.
pub fn freedman_diaconis_bins(values: &[f64]) -> usize {
    let n = values.len();
    if n <= 1 {
        return 1;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("wait samples are finite"));

    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
    let range = sorted[n - 1] - sorted[0];
    if iqr == 0.0 || range == 0.0 {
        return 1;
    }

    let width = 2.0 * iqr / (n as f64).cbrt();
    ((range / width).ceil() as usize).max(1)
}

/// Bin `wait_seconds` after converting them to `unit`
///
/// With `explicit_bins` unset the count comes from [`freedman_diaconis_bins`].
/// Identical samples collapse to a single bucket of width one unit so the
/// histogram stays drawable.
pub fn build_histogram(
    wait_seconds: &[f64],
    explicit_bins: Option<usize>,
    unit: Unit,
) -> Result<HistogramSpec, HistogramError> {
    if wait_seconds.is_empty() {
        return Err(HistogramError::NoSamples);
    }

    let values: Vec<f64> = wait_seconds.iter().map(|&s| unit.convert(s)).collect();

    let requested = match explicit_bins {
        Some(0) => return Err(HistogramError::InvalidBinCount),
        Some(bins) => bins,
        None => freedman_diaconis_bins(&values),
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (bins, max_edge, width) = if max > min {
        (requested, max, (max - min) / requested as f64)
    } else {
        (1, min + 1.0, 1.0)
    };

    // the last edge is pinned to the true maximum so rounding in the
    // interior edges never shrinks the span
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { max_edge } else { min + width * i as f64 })
        .collect();

    let mut counts = vec![0u64; bins];
    for &value in &values {
        let idx = ((value - min) / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    Ok(HistogramSpec { edges, counts, unit })
}

//! Waiting-time summary statistics

/// Count and mean of the waiting-time samples that survived filtering
#[derive(Debug, Clone, PartialEq)]
pub struct WaitStats {
    pub count: usize,
    /// Arithmetic mean in seconds; `None` when there are no samples
    pub mean_seconds: Option<f64>,
}

impl WaitStats {
    /// Summarise a sample set
    ///
    /// An empty set yields a zero count and no mean: nothing to report,
    /// not an error.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                count: 0,
                mean_seconds: None,
            };
        }
        Self {
            count: samples.len(),
            mean_seconds: Some(compensated_sum(samples) / samples.len() as f64),
        }
    }
}

/// Neumaier-compensated summation; keeps the mean stable when sample
/// magnitudes differ wildly
fn compensated_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &value in values {
        let t = sum + value;
        if sum.abs() >= value.abs() {
            compensation += (sum - t) + value;
        } else {
            compensation += (value - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

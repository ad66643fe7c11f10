//! JSON plot-data artifact
//!
//! Serializes the binned distribution next to the summary so external
//! plotting tools can re-render a report without re-querying sacct. The
//! arrays stay flat and columnar on purpose.

use crate::histogram::HistogramSpec;
use crate::stats::WaitStats;
use crate::time_utils::TimeWindow;
use serde::{Deserialize, Serialize};

/// Query window as it appears in the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWindow {
    /// Window start, RFC 3339
    pub start: String,
    /// Window end (exclusive), RFC 3339
    pub end: String,
    /// IANA timezone the report was computed in
    pub timezone: String,
}

/// Root plot-data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotData {
    /// Tool version that produced the artifact
    pub version: String,
    /// Format name
    pub format: String,
    /// Query window
    pub window: JsonWindow,
    /// Number of jobs that survived filtering
    pub count: usize,
    /// Mean waiting time in seconds
    pub mean_seconds: f64,
    /// Unit of the bin edges ("seconds" or "minutes")
    pub unit: String,
    /// `bins + 1` ascending bin edges
    pub bin_edges: Vec<f64>,
    /// Jobs per bucket
    pub bin_counts: Vec<u64>,
}

impl PlotData {
    /// Assemble the artifact from a report's parts
    ///
    /// Callers guarantee a non-empty sample set, so `stats` always
    /// carries a mean here.
    pub fn new(window: &TimeWindow, stats: &WaitStats, spec: &HistogramSpec) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "slurm-waiting-times-v1".to_string(),
            window: JsonWindow {
                start: window.start.to_rfc3339(),
                end: window.end.to_rfc3339(),
                timezone: window.tz.name().to_string(),
            },
            count: stats.count,
            mean_seconds: stats.mean_seconds.unwrap_or(0.0),
            unit: spec.unit.as_str().to_string(),
            bin_edges: spec.edges.clone(),
            bin_counts: spec.counts.clone(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

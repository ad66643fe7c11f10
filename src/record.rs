//! Job record model for sacct accounting rows
//!
//! `SacctRow` is one raw row as emitted by `sacct --parsable2`; `JobRecord`
//! is a row that survived filtering, carrying its derived waiting time.
//! Identifier and job-type classification are derived purely from row
//! contents, never from external lookups.

use chrono::DateTime;
use chrono_tz::Tz;
use clap::ValueEnum;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Classification of a sacct identifier by its textual shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobIdKind {
    /// Bare numeric id, e.g. `123`
    Job,
    /// Job-array task such as `123_4`, an independent first-class job
    ArrayTask,
    /// Internal step such as `123.batch` or `123.extern`
    Step,
}

impl JobIdKind {
    /// Classify an identifier
    ///
    /// A dotted id is a step even when its prefix carries an array suffix
    /// (`123_4.batch` is a step, not an array task).
    pub fn classify(job_id: &str) -> Self {
        if job_id.contains('.') {
            JobIdKind::Step
        } else if job_id.contains('_') {
            JobIdKind::ArrayTask
        } else {
            JobIdKind::Job
        }
    }
}

/// Job type derived from node count and TRES allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobType {
    #[value(name = "cpu-only")]
    CpuOnly,
    #[value(name = "1-gpu")]
    OneGpu,
    /// Multi-GPU on a single node
    #[value(name = "single-node")]
    SingleNode,
    #[value(name = "multi-node")]
    MultiNode,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::CpuOnly => "cpu-only",
            JobType::OneGpu => "1-gpu",
            JobType::SingleNode => "single-node",
            JobType::MultiNode => "multi-node",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn gpu_count_re() -> &'static Regex {
    static GPU_COUNT_RE: OnceLock<Regex> = OnceLock::new();
    GPU_COUNT_RE.get_or_init(|| {
        Regex::new(r"(?:gres/)?gpu(?::[A-Za-z0-9_.-]+)?[=:](\d+)").expect("valid gpu count regex")
    })
}

/// Number of GPUs named by an `AllocTRES` string
///
/// Understands `gres/gpu=2`, typed forms like `gres/gpu:a100=4`, and the
/// bare `gpu:4` shorthand. Anything else counts as zero.
fn gpu_count(alloc_tres: &str) -> u64 {
    gpu_count_re()
        .captures(alloc_tres)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Derive the job type from allocation metadata
///
/// More than one node wins over any GPU allocation; rows with neither
/// field populated classify as CPU-only.
pub fn determine_job_type(nodes: Option<u32>, alloc_tres: Option<&str>) -> JobType {
    if nodes.is_some_and(|n| n > 1) {
        return JobType::MultiNode;
    }
    match alloc_tres.map(gpu_count).unwrap_or(0) {
        0 => JobType::CpuOnly,
        1 => JobType::OneGpu,
        _ => JobType::SingleNode,
    }
}

/// One raw row emitted by `sacct --parsable2 --noheader`
///
/// Submit/Start sentinels ("Unknown", "None", ...) are already resolved to
/// `None` at parse time; the filter stage classifies such rows, the parser
/// never drops them.
#[derive(Debug, Clone, PartialEq)]
pub struct SacctRow {
    pub job_id: String,
    pub user: String,
    pub submit: Option<DateTime<Tz>>,
    pub start: Option<DateTime<Tz>>,
    pub state: String,
    pub partition: String,
    /// NNodes column; `None` when empty or unparseable
    pub nodes: Option<u32>,
    /// AllocTRES column, verbatim
    pub alloc_tres: Option<String>,
    /// Elapsed column converted to seconds
    pub elapsed_seconds: Option<f64>,
}

impl SacctRow {
    /// Identifier classification for this row
    pub fn kind(&self) -> JobIdKind {
        JobIdKind::classify(&self.job_id)
    }

    /// Job type derived from NNodes and AllocTRES
    pub fn job_type(&self) -> JobType {
        determine_job_type(self.nodes, self.alloc_tres.as_deref())
    }
}

/// A row that passed every filter, augmented with its waiting time
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub job_id: String,
    pub user: String,
    pub submit: DateTime<Tz>,
    pub start: DateTime<Tz>,
    pub state: String,
    pub partition: String,
    pub nodes: Option<u32>,
    pub alloc_tres: Option<String>,
    pub elapsed_seconds: Option<f64>,
    pub kind: JobIdKind,
    pub job_type: JobType,
    /// Start minus Submit, never negative
    pub wait_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_job_id() {
        assert_eq!(JobIdKind::classify("12345"), JobIdKind::Job);
    }

    #[test]
    fn test_classify_array_task() {
        assert_eq!(JobIdKind::classify("12345_7"), JobIdKind::ArrayTask);
    }

    #[test]
    fn test_classify_step() {
        assert_eq!(JobIdKind::classify("12345.batch"), JobIdKind::Step);
        assert_eq!(JobIdKind::classify("12345.extern"), JobIdKind::Step);
        assert_eq!(JobIdKind::classify("12345.0"), JobIdKind::Step);
    }

    #[test]
    fn test_classify_array_task_step_is_a_step() {
        assert_eq!(JobIdKind::classify("12345_7.batch"), JobIdKind::Step);
    }

    #[test]
    fn test_job_type_no_allocation_is_cpu_only() {
        assert_eq!(determine_job_type(Some(1), None), JobType::CpuOnly);
        assert_eq!(determine_job_type(None, None), JobType::CpuOnly);
    }

    #[test]
    fn test_job_type_cpu_only_tres() {
        assert_eq!(
            determine_job_type(Some(1), Some("cpu=8,mem=32G,node=1")),
            JobType::CpuOnly
        );
    }

    #[test]
    fn test_job_type_one_gpu() {
        assert_eq!(
            determine_job_type(Some(1), Some("cpu=4,gres/gpu=1,mem=16G")),
            JobType::OneGpu
        );
    }

    #[test]
    fn test_job_type_multi_gpu_single_node() {
        assert_eq!(
            determine_job_type(Some(1), Some("gres/gpu:a100=4")),
            JobType::SingleNode
        );
    }

    #[test]
    fn test_job_type_bare_gpu_shorthand() {
        assert_eq!(determine_job_type(Some(1), Some("gpu:4")), JobType::SingleNode);
    }

    #[test]
    fn test_job_type_multi_node_wins_over_gpus() {
        assert_eq!(
            determine_job_type(Some(3), Some("gres/gpu=1")),
            JobType::MultiNode
        );
        assert_eq!(determine_job_type(Some(2), Some("gpu:4")), JobType::MultiNode);
    }

    #[test]
    fn test_job_type_display_names() {
        assert_eq!(JobType::CpuOnly.to_string(), "cpu-only");
        assert_eq!(JobType::OneGpu.to_string(), "1-gpu");
        assert_eq!(JobType::SingleNode.to_string(), "single-node");
        assert_eq!(JobType::MultiNode.to_string(), "multi-node");
    }

    #[test]
    fn test_gpu_count_ignores_other_tres() {
        assert_eq!(gpu_count("cpu=8,mem=32G,billing=8"), 0);
    }

    #[test]
    fn test_gpu_count_typed_gres() {
        assert_eq!(gpu_count("cpu=16,gres/gpu:tesla=2,node=1"), 2);
    }
}

//! Record filtering pipeline
//!
//! Turns raw sacct rows into clean job records, applying the configured
//! filters in a fixed order and counting every dropped row by reason.
//! The pipeline is pure: a malformed row is counted and skipped, never
//! fatal, and input order is preserved.

use crate::record::{JobIdKind, JobRecord, JobType, SacctRow};
use crate::time_utils::{self, WindowError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::trace;

/// Shell-style wildcard pattern (`*`, `?`, `[...]`, `[!...]`) compiled to
/// an anchored regex over the whole value
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    re: Regex,
}

impl GlobPattern {
    /// Compile a wildcard pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(&translate(pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            re,
        })
    }

    /// True when the whole of `value` matches the pattern
    pub fn matches(&self, value: &str) -> bool {
        self.re.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Translate a wildcard pattern into anchored regex source
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::with_capacity(pattern.len() + 4);
    re.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                // scan for the closing bracket; a ']' directly after the
                // opening (or after the negation marker) is a class member
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '!' || chars[j] == '^') {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    // unterminated class matches a literal bracket
                    re.push_str(r"\[");
                } else {
                    let inner: String = chars[i + 1..j].iter().collect();
                    let (negated, body) = match inner.strip_prefix(['!', '^']) {
                        Some(rest) => (true, rest),
                        None => (false, inner.as_str()),
                    };
                    re.push('[');
                    if negated {
                        re.push('^');
                    }
                    re.push_str(&body.replace('\\', r"\\").replace(']', r"\]"));
                    re.push(']');
                    i = j;
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }

    re.push('$');
    re
}

/// Bounds on elapsed runtime, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuntimeConstraint {
    pub min_seconds: Option<f64>,
    pub max_seconds: Option<f64>,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl RuntimeConstraint {
    /// True when `elapsed` satisfies both bounds
    pub fn matches(&self, elapsed: f64) -> bool {
        if let Some(min) = self.min_seconds {
            if elapsed < min || (!self.min_inclusive && elapsed == min) {
                return false;
            }
        }
        if let Some(max) = self.max_seconds {
            if elapsed > max || (!self.max_inclusive && elapsed == max) {
                return false;
            }
        }
        true
    }
}

/// Errors raised while parsing a `--runtime` expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeExprError {
    #[error("--runtime requires a non-empty value")]
    Empty,

    #[error("Invalid --runtime value '{0}': missing duration")]
    MissingDuration(String),

    #[error("Invalid --runtime value '{value}': {source}")]
    BadDuration {
        value: String,
        #[source]
        source: WindowError,
    },

    #[error("Invalid --runtime range '{0}': start exceeds end")]
    InvertedRange(String),
}

fn runtime_range_re() -> &'static Regex {
    static RUNTIME_RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RUNTIME_RANGE_RE.get_or_init(|| {
        Regex::new(
            r"^(?P<lo>(?:\d+-)?\d+:[0-5]?\d:[0-5]?\d)-(?P<hi>(?:\d+-)?\d+:[0-5]?\d:[0-5]?\d)$",
        )
        .expect("valid runtime range regex")
    })
}

fn parse_seconds(duration: &str, original: &str) -> Result<f64, RuntimeExprError> {
    time_utils::parse_duration_to_seconds(duration).map_err(|source| {
        RuntimeExprError::BadDuration {
            value: original.trim().to_string(),
            source,
        }
    })
}

/// Parse one `--runtime` expression into a constraint
///
/// Accepted forms: `shorter:D`/`longer:D` (strict bounds), comparison
/// prefixes `<`, `<=`, `>`, `>=`, `=`, an inclusive range `D1-D2`, and a
/// bare duration meaning exact equality. Durations are `[DD-]HH:MM:SS`.
pub fn parse_runtime_expr(value: &str) -> Result<RuntimeConstraint, RuntimeExprError> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err(RuntimeExprError::Empty);
    }
    let lowered = raw.to_lowercase();

    for (prefix, is_upper_bound) in [("shorter:", true), ("longer:", false)] {
        if lowered.starts_with(prefix) {
            let duration = raw[prefix.len()..].trim();
            if duration.is_empty() {
                return Err(RuntimeExprError::MissingDuration(raw.to_string()));
            }
            let seconds = parse_seconds(duration, raw)?;
            return Ok(if is_upper_bound {
                RuntimeConstraint {
                    max_seconds: Some(seconds),
                    ..RuntimeConstraint::default()
                }
            } else {
                RuntimeConstraint {
                    min_seconds: Some(seconds),
                    ..RuntimeConstraint::default()
                }
            });
        }
    }

    if let Some(caps) = runtime_range_re().captures(raw) {
        let lo = parse_seconds(&caps["lo"], raw)?;
        let hi = parse_seconds(&caps["hi"], raw)?;
        if lo > hi {
            return Err(RuntimeExprError::InvertedRange(raw.to_string()));
        }
        return Ok(RuntimeConstraint {
            min_seconds: Some(lo),
            max_seconds: Some(hi),
            min_inclusive: true,
            max_inclusive: true,
        });
    }

    for (op, inclusive) in [("<=", true), (">=", true), ("<", false), (">", false)] {
        if let Some(rest) = raw.strip_prefix(op) {
            let seconds = parse_seconds(rest.trim(), raw)?;
            return Ok(if op.starts_with('<') {
                RuntimeConstraint {
                    max_seconds: Some(seconds),
                    max_inclusive: inclusive,
                    ..RuntimeConstraint::default()
                }
            } else {
                RuntimeConstraint {
                    min_seconds: Some(seconds),
                    min_inclusive: inclusive,
                    ..RuntimeConstraint::default()
                }
            });
        }
    }

    let exact = raw.strip_prefix('=').unwrap_or(raw);
    let seconds = parse_seconds(exact.trim(), raw)?;
    Ok(RuntimeConstraint {
        min_seconds: Some(seconds),
        max_seconds: Some(seconds),
        min_inclusive: true,
        max_inclusive: true,
    })
}

/// Why a row was excluded from the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Submit or Start unset/unparseable, or Start before Submit
    InvalidTimestamp,
    StepExcluded,
    UserExcluded,
    PartitionExcluded,
    JobTypeExcluded,
    OutlierExcluded,
    RuntimeExcluded,
}

/// Per-reason counters for dropped rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub invalid_timestamp: u64,
    pub step_excluded: u64,
    pub user_excluded: u64,
    pub partition_excluded: u64,
    pub job_type_excluded: u64,
    pub outlier_excluded: u64,
    pub runtime_excluded: u64,
}

impl DropCounts {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::InvalidTimestamp => self.invalid_timestamp += 1,
            DropReason::StepExcluded => self.step_excluded += 1,
            DropReason::UserExcluded => self.user_excluded += 1,
            DropReason::PartitionExcluded => self.partition_excluded += 1,
            DropReason::JobTypeExcluded => self.job_type_excluded += 1,
            DropReason::OutlierExcluded => self.outlier_excluded += 1,
            DropReason::RuntimeExcluded => self.runtime_excluded += 1,
        }
    }

    /// Rows dropped across all reasons
    pub fn total(&self) -> u64 {
        self.invalid_timestamp
            + self.step_excluded
            + self.user_excluded
            + self.partition_excluded
            + self.job_type_excluded
            + self.outlier_excluded
            + self.runtime_excluded
    }
}

/// Filter configuration consumed by [`filter_rows`]
///
/// The default keeps every row that has valid timestamps and is not a
/// step.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Keep `.batch`/`.extern` step rows
    pub include_steps: bool,
    /// Exact-match user allowlist; `None` or empty keeps every user
    pub users: Option<HashSet<String>>,
    /// Partition patterns; `None` or empty keeps every partition
    pub partitions: Option<Vec<GlobPattern>>,
    /// Keep only jobs of this derived type
    pub job_type: Option<JobType>,
    /// Drop jobs that waited longer than this many hours
    pub max_wait_hours: Option<f64>,
    /// Elapsed-runtime constraints; a row must satisfy all of them
    pub runtime: Vec<RuntimeConstraint>,
}

/// Result of one filtering pass
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub records: Vec<JobRecord>,
    pub drops: DropCounts,
}

fn evaluate(
    row: &SacctRow,
    config: &FilterConfig,
    wait_cap: Option<f64>,
) -> Result<JobRecord, DropReason> {
    let (submit, start) = match (row.submit, row.start) {
        (Some(submit), Some(start)) if start >= submit => (submit, start),
        _ => return Err(DropReason::InvalidTimestamp),
    };

    let kind = row.kind();
    if kind == JobIdKind::Step && !config.include_steps {
        return Err(DropReason::StepExcluded);
    }

    if let Some(users) = config.users.as_ref().filter(|u| !u.is_empty()) {
        if !users.contains(&row.user) {
            return Err(DropReason::UserExcluded);
        }
    }

    if let Some(patterns) = config.partitions.as_ref().filter(|p| !p.is_empty()) {
        if !patterns.iter().any(|p| p.matches(&row.partition)) {
            return Err(DropReason::PartitionExcluded);
        }
    }

    let job_type = row.job_type();
    if let Some(wanted) = config.job_type {
        if job_type != wanted {
            return Err(DropReason::JobTypeExcluded);
        }
    }

    let wait_seconds = (start - submit).num_seconds() as f64;
    if let Some(cap) = wait_cap {
        if wait_seconds > cap {
            return Err(DropReason::OutlierExcluded);
        }
    }

    if !config.runtime.is_empty() {
        match row.elapsed_seconds {
            Some(elapsed) if config.runtime.iter().all(|c| c.matches(elapsed)) => {}
            _ => return Err(DropReason::RuntimeExcluded),
        }
    }

    Ok(JobRecord {
        job_id: row.job_id.clone(),
        user: row.user.clone(),
        submit,
        start,
        state: row.state.clone(),
        partition: row.partition.clone(),
        nodes: row.nodes,
        alloc_tres: row.alloc_tres.clone(),
        elapsed_seconds: row.elapsed_seconds,
        kind,
        job_type,
        wait_seconds,
    })
}

/// Apply every configured filter to `rows`, preserving input order
///
/// Each row either becomes a [`JobRecord`] or is counted under exactly
/// one [`DropReason`].
pub fn filter_rows(rows: &[SacctRow], config: &FilterConfig) -> FilterOutcome {
    let wait_cap = config.max_wait_hours.map(|hours| hours * 3_600.0);
    let mut outcome = FilterOutcome::default();

    for row in rows {
        match evaluate(row, config, wait_cap) {
            Ok(record) => outcome.records.push(record),
            Err(reason) => {
                trace!(job_id = %row.job_id, ?reason, "row dropped");
                outcome.drops.record(reason);
            }
        }
    }

    outcome
}

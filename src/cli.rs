//! CLI argument parsing for the waiting-time reporter

use crate::histogram::Unit;
use crate::record::JobType;
use crate::time_utils::TimeWindow;
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "slurm-waiting-times")]
#[command(version)]
#[command(about = "Report Slurm job waiting times from sacct accounting data", long_about = None)]
pub struct Cli {
    /// Start of the query window (ISO timestamp, date, or YYYY-MM)
    #[arg(long, value_name = "WHEN")]
    pub start: Option<String>,

    /// End of the query window, exclusive (ISO timestamp, date, or YYYY-MM)
    #[arg(long, value_name = "WHEN")]
    pub end: Option<String>,

    /// Comma-separated users to include (exact match)
    #[arg(long = "user", value_name = "USERS")]
    pub user: Option<String>,

    /// Comma-separated partitions to include; shell wildcards are matched locally
    #[arg(long = "partition", value_name = "PARTITIONS")]
    pub partition: Option<String>,

    /// Keep only jobs of one type derived from the allocation metadata
    #[arg(long = "job-type", value_enum, value_name = "TYPE")]
    pub job_type: Option<JobType>,

    /// Include job steps such as .batch and .extern rows
    #[arg(long = "include-steps")]
    pub include_steps: bool,

    /// IANA timezone for interpreting timestamps (default: host zone)
    #[arg(long = "tz", value_name = "ZONE")]
    pub tz: Option<String>,

    /// Print the sacct command instead of running it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Explicit histogram bin count (default: Freedman-Diaconis)
    #[arg(long = "bins", value_name = "N")]
    pub bins: Option<usize>,

    /// Bin waiting times in seconds instead of minutes
    #[arg(long = "bin-seconds")]
    pub bin_seconds: bool,

    /// Discard jobs that waited longer than this many hours
    #[arg(long = "max-wait-hours", value_name = "HOURS")]
    pub max_wait_hours: Option<f64>,

    /// Elapsed-runtime filter, repeatable (e.g. "<01:00:00", "longer:00:10:00",
    /// "00:05:00-01:00:00")
    #[arg(long = "runtime", value_name = "EXPR")]
    pub runtime: Vec<String>,

    /// Enable verbose tracing output on stderr
    #[arg(long)]
    pub debug: bool,
}

/// Split a comma-separated option into trimmed, non-empty parts
pub fn split_arg(value: Option<&str>) -> Option<Vec<String>> {
    let parts: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// True when any pattern carries a shell wildcard
pub fn has_wildcard(patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| p.chars().any(|c| matches!(c, '*' | '?' | '[')))
}

/// Render a window bound for a filename token, keeping only as much
/// precision as the value carries
fn format_datetime_token(value: DateTime<Tz>) -> String {
    if value.second() != 0 || value.nanosecond() != 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else if value.hour() == 0 && value.minute() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M").to_string()
    }
}

impl Cli {
    /// Histogram axis unit selected by the flags
    pub fn unit(&self) -> Unit {
        if self.bin_seconds {
            Unit::Seconds
        } else {
            Unit::Minutes
        }
    }

    /// Tokens describing the non-default options, used for artifact naming
    ///
    /// The start token only appears when a start was given explicitly; the
    /// end token always does, so two runs over different windows never
    /// share a prefix.
    pub fn option_tokens(&self, window: &TimeWindow) -> Vec<String> {
        let mut tokens = Vec::new();

        if self.start.is_some() {
            tokens.push(format!("start={}", format_datetime_token(window.start)));
        }
        tokens.push(format!("end={}", format_datetime_token(window.end)));

        match split_arg(self.user.as_deref()) {
            Some(users) => tokens.push(format!("user={}", users.join(","))),
            None => tokens.push("user=all".to_string()),
        }
        if let Some(partitions) = split_arg(self.partition.as_deref()) {
            tokens.push(format!("partition={}", partitions.join(",")));
        }
        if self.include_steps {
            tokens.push("steps".to_string());
        }
        if let Some(job_type) = self.job_type {
            tokens.push(format!("jobtype={job_type}"));
        }
        if let Some(bins) = self.bins {
            tokens.push(format!("bins={bins}"));
        }
        if self.bin_seconds {
            tokens.push("seconds".to_string());
        }
        if let Some(max_wait) = self.max_wait_hours {
            tokens.push(format!("maxwait={max_wait}"));
        }
        for expr in &self.runtime {
            tokens.push(format!("runtime={}", expr.trim()));
        }
        // the timezone is intentionally left out of the prefix

        tokens
    }

    /// Plot title summarising the window and active filters
    pub fn report_title(&self, window: &TimeWindow) -> String {
        let users = split_arg(self.user.as_deref())
            .map(|u| u.join(","))
            .unwrap_or_else(|| "all users".to_string());
        let partitions = split_arg(self.partition.as_deref())
            .map(|p| p.join(","))
            .unwrap_or_else(|| "all partitions".to_string());

        let mut details = vec![users, partitions];
        if let Some(job_type) = self.job_type {
            details.push(job_type.to_string());
        }
        if self.include_steps {
            details.push("steps included".to_string());
        }

        format!(
            "Waiting times {} → {} ({})",
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d"),
            details.join("; ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::resolve_window;
    use chrono::TimeZone;

    fn window_for(cli: &Cli) -> TimeWindow {
        let now = chrono_tz::UTC.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap();
        resolve_window(cli.start.as_deref(), cli.end.as_deref(), now).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["slurm-waiting-times"]);
        assert!(cli.start.is_none());
        assert!(cli.end.is_none());
        assert!(!cli.include_steps);
        assert!(!cli.dry_run);
        assert!(cli.bins.is_none());
        assert!(cli.runtime.is_empty());
        assert_eq!(cli.unit(), Unit::Minutes);
    }

    #[test]
    fn test_cli_parses_filters() {
        let cli = Cli::parse_from([
            "slurm-waiting-times",
            "--user",
            "alice,bob",
            "--partition",
            "gpu*",
            "--job-type",
            "1-gpu",
            "--include-steps",
        ]);
        assert_eq!(cli.user.as_deref(), Some("alice,bob"));
        assert_eq!(cli.partition.as_deref(), Some("gpu*"));
        assert_eq!(cli.job_type, Some(JobType::OneGpu));
        assert!(cli.include_steps);
    }

    #[test]
    fn test_cli_repeatable_runtime() {
        let cli = Cli::parse_from([
            "slurm-waiting-times",
            "--runtime",
            ">00:01:00",
            "--runtime",
            "<01:00:00",
        ]);
        assert_eq!(cli.runtime, vec![">00:01:00", "<01:00:00"]);
    }

    #[test]
    fn test_cli_bin_seconds_switches_unit() {
        let cli = Cli::parse_from(["slurm-waiting-times", "--bin-seconds"]);
        assert_eq!(cli.unit(), Unit::Seconds);
    }

    #[test]
    fn test_split_arg_trims_and_drops_empties() {
        assert_eq!(
            split_arg(Some(" alice , ,bob ")),
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
        assert_eq!(split_arg(Some(" , ")), None);
        assert_eq!(split_arg(None), None);
    }

    #[test]
    fn test_has_wildcard() {
        let plain = vec!["main".to_string(), "debug".to_string()];
        assert!(!has_wildcard(&plain));
        let starred = vec!["gpu*".to_string()];
        assert!(has_wildcard(&starred));
        let class = vec!["gpu[0-3]".to_string()];
        assert!(has_wildcard(&class));
    }

    #[test]
    fn test_tokens_default_run_names_end_and_users() {
        let cli = Cli::parse_from(["slurm-waiting-times"]);
        let tokens = cli.option_tokens(&window_for(&cli));
        assert_eq!(tokens, vec!["end=2025-09-15T12:00", "user=all"]);
    }

    #[test]
    fn test_tokens_include_explicit_start() {
        let cli = Cli::parse_from([
            "slurm-waiting-times",
            "--start",
            "2025-09-01",
            "--end",
            "2025-09-08",
        ]);
        let tokens = cli.option_tokens(&window_for(&cli));
        assert_eq!(
            tokens,
            vec!["start=2025-09-01", "end=2025-09-08", "user=all"]
        );
    }

    #[test]
    fn test_tokens_carry_non_default_options() {
        let cli = Cli::parse_from([
            "slurm-waiting-times",
            "--user",
            "alice",
            "--partition",
            "gpu*",
            "--include-steps",
            "--job-type",
            "cpu-only",
            "--bins",
            "30",
            "--bin-seconds",
            "--max-wait-hours",
            "48",
            "--runtime",
            "<01:00:00",
        ]);
        let tokens = cli.option_tokens(&window_for(&cli));
        assert_eq!(
            tokens,
            vec![
                "end=2025-09-15T12:00",
                "user=alice",
                "partition=gpu*",
                "steps",
                "jobtype=cpu-only",
                "bins=30",
                "seconds",
                "maxwait=48",
                "runtime=<01:00:00",
            ]
        );
    }

    #[test]
    fn test_token_datetime_precision() {
        let tz = chrono_tz::UTC;
        let midnight = tz.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        assert_eq!(format_datetime_token(midnight), "2025-09-01");
        let minutes = tz.with_ymd_and_hms(2025, 9, 1, 13, 30, 0).unwrap();
        assert_eq!(format_datetime_token(minutes), "2025-09-01T13:30");
        let seconds = tz.with_ymd_and_hms(2025, 9, 1, 13, 30, 45).unwrap();
        assert_eq!(format_datetime_token(seconds), "2025-09-01T13:30:45");
    }

    #[test]
    fn test_title_defaults() {
        let cli = Cli::parse_from([
            "slurm-waiting-times",
            "--start",
            "2025-09-01",
            "--end",
            "2025-09-08",
        ]);
        assert_eq!(
            cli.report_title(&window_for(&cli)),
            "Waiting times 2025-09-01 → 2025-09-08 (all users; all partitions)"
        );
    }

    #[test]
    fn test_title_names_filters() {
        let cli = Cli::parse_from([
            "slurm-waiting-times",
            "--start",
            "2025-09-01",
            "--end",
            "2025-09-08",
            "--user",
            "alice",
            "--partition",
            "gpu",
            "--job-type",
            "multi-node",
            "--include-steps",
        ]);
        assert_eq!(
            cli.report_title(&window_for(&cli)),
            "Waiting times 2025-09-01 → 2025-09-08 (alice; gpu; multi-node; steps included)"
        );
    }
}

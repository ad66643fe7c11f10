//! sacct invocation and output parsing
//!
//! Builds the accounting query, runs it, and turns `--parsable2` output
//! into [`SacctRow`]s. Individual malformed lines are skipped with a
//! warning; only a failed or undecodable sacct run is fatal.

use crate::record::SacctRow;
use crate::time_utils;
use chrono::DateTime;
use chrono_tz::Tz;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// Columns requested from sacct, in order
pub const SACCT_FORMAT: &str = "JobID,User,Submit,Start,State,Partition,NNodes,AllocTRES,Elapsed";

/// Submit/Start values that mean "not set", compared case-insensitively
const SENTINEL_VALUES: &[&str] = &["unknown", "none", "", "n/a", "invalid"];

const EXPECTED_FIELDS: usize = 9;

/// Errors raised when the sacct query itself fails
#[derive(Error, Debug)]
pub enum SacctError {
    #[error("sacct command not found; is this host a Slurm submit node?")]
    NotFound,

    #[error("failed to run sacct: {0}")]
    Spawn(std::io::Error),

    #[error("sacct exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("sacct output is not valid UTF-8: {0}")]
    MalformedOutput(std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, SacctError>;

/// Assemble the sacct argument vector for a resolved window
///
/// Steps are collapsed with `-X` unless requested; with no explicit user
/// list `-a` asks for every user's jobs. Callers must screen out wildcard
/// partition patterns beforehand, sacct only accepts literal names.
pub fn build_sacct_command(
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    users: Option<&[String]>,
    partitions: Option<&[String]>,
    include_steps: bool,
) -> Vec<String> {
    let mut command = vec![
        "sacct".to_string(),
        "--parsable2".to_string(),
        "--noheader".to_string(),
        format!("--format={SACCT_FORMAT}"),
        "-S".to_string(),
        start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "-E".to_string(),
        end.format("%Y-%m-%dT%H:%M:%S").to_string(),
    ];

    if !include_steps {
        command.push("-X".to_string());
    }

    match users {
        Some(users) if !users.is_empty() => {
            command.push("--user".to_string());
            command.push(users.join(","));
        }
        _ => command.push("-a".to_string()),
    }

    if let Some(partitions) = partitions.filter(|p| !p.is_empty()) {
        command.push("--partition".to_string());
        command.push(partitions.join(","));
    }

    command
}

/// Run the given sacct command and capture its stdout
pub fn run_sacct(command: &[String]) -> Result<String> {
    debug!("running: {}", command.join(" "));

    let output = Command::new(&command[0])
        .args(&command[1..])
        .output()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                SacctError::NotFound
            } else {
                SacctError::Spawn(err)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(SacctError::Failed {
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    String::from_utf8(output.stdout).map_err(SacctError::MalformedOutput)
}

fn parse_timestamp(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let trimmed = value.trim();
    if SENTINEL_VALUES.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    match time_utils::parse_datetime(trimmed, tz) {
        Ok(dt) => Some(dt),
        Err(_) => {
            warn!("unparseable timestamp '{trimmed}' treated as unset");
            None
        }
    }
}

/// Parse `--parsable2 --noheader` output into rows
///
/// Lines with the wrong field count are skipped with a warning. Sentinel
/// or unparseable Submit/Start values become `None`; deciding what to do
/// with such rows is the filter's job.
pub fn parse_sacct_output(output: &str, tz: Tz) -> Vec<SacctRow> {
    let mut rows = Vec::new();

    for raw_line in output.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() != EXPECTED_FIELDS {
            warn!(
                "skipping sacct row with {} fields (expected {EXPECTED_FIELDS}): {line}",
                parts.len()
            );
            continue;
        }

        rows.push(SacctRow {
            job_id: parts[0].to_string(),
            user: parts[1].to_string(),
            submit: parse_timestamp(parts[2], tz),
            start: parse_timestamp(parts[3], tz),
            state: parts[4].to_string(),
            partition: parts[5].to_string(),
            nodes: parts[6].trim().parse().ok(),
            alloc_tres: match parts[7].trim() {
                "" => None,
                tres => Some(tres.to_string()),
            },
            elapsed_seconds: time_utils::parse_duration_to_seconds(parts[8]).ok(),
        });
    }

    rows
}

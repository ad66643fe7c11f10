//! Report artifact naming and the output directory
//!
//! Derives a filesystem-safe prefix from the non-default CLI options so
//! the CSV/SVG/JSON artifacts of one run sort together and never collide
//! with a differently parameterised run.

use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const OUTPUT_DIR: &str = "output";
const MAX_PREFIX_LEN: usize = 80;

fn sanitize_re() -> &'static Regex {
    static SANITIZE_RE: OnceLock<Regex> = OnceLock::new();
    SANITIZE_RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9,._=-]").expect("valid sanitize regex"))
}

/// Join option tokens into a filesystem-safe fragment
///
/// Returns `None` when there are no tokens, i.e. every option was left
/// at its default.
pub fn compact_args(tokens: &[String]) -> Option<String> {
    if tokens.is_empty() {
        return None;
    }
    let joined = tokens
        .iter()
        .map(|t| t.replace(' ', "_"))
        .collect::<Vec<_>>()
        .join("_");
    let mut sanitized = sanitize_re().replace_all(&joined, "_").into_owned();
    if sanitized.len() > MAX_PREFIX_LEN {
        // sanitized text is pure ASCII, truncation cannot split a char
        sanitized.truncate(MAX_PREFIX_LEN);
    }
    Some(sanitized)
}

/// Artifact filename prefix: the option fragment, or the run date when
/// every option is default
pub fn build_prefix(now: DateTime<Tz>, tokens: &[String]) -> String {
    compact_args(tokens).unwrap_or_else(|| now.format("%Y-%m-%d").to_string())
}

/// Create the output directory if needed and return its path
pub fn ensure_output_dir() -> Result<PathBuf> {
    let dir = PathBuf::from(OUTPUT_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    Ok(dir)
}

pub fn results_csv_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}-waiting-times.csv"))
}

pub fn histogram_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}-waiting-times.svg"))
}

pub fn plot_data_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}-waiting-times.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_compact_args_empty_is_none() {
        assert_eq!(compact_args(&[]), None);
    }

    #[test]
    fn test_compact_args_joins_with_underscores() {
        let fragment = compact_args(&tokens(&["user=alice", "steps"])).unwrap();
        assert_eq!(fragment, "user=alice_steps");
    }

    #[test]
    fn test_compact_args_sanitizes_hostile_characters() {
        let fragment = compact_args(&tokens(&["partition=gpu*", "a b/c"])).unwrap();
        assert_eq!(fragment, "partition=gpu__a_b_c");
    }

    #[test]
    fn test_compact_args_caps_length() {
        let long = "x".repeat(300);
        let fragment = compact_args(&tokens(&[&long])).unwrap();
        assert_eq!(fragment.len(), 80);
    }

    #[test]
    fn test_prefix_falls_back_to_run_date() {
        let now = chrono_tz::UTC.with_ymd_and_hms(2025, 9, 15, 12, 30, 0).unwrap();
        assert_eq!(build_prefix(now, &[]), "2025-09-15");
    }

    #[test]
    fn test_prefix_prefers_tokens() {
        let now = chrono_tz::UTC.with_ymd_and_hms(2025, 9, 15, 12, 30, 0).unwrap();
        assert_eq!(build_prefix(now, &tokens(&["user=bob"])), "user=bob");
    }

    #[test]
    fn test_artifact_paths_share_prefix() {
        let dir = Path::new("output");
        assert_eq!(
            results_csv_path(dir, "p").to_str().unwrap(),
            "output/p-waiting-times.csv"
        );
        assert_eq!(
            histogram_path(dir, "p").to_str().unwrap(),
            "output/p-waiting-times.svg"
        );
        assert_eq!(
            plot_data_path(dir, "p").to_str().unwrap(),
            "output/p-waiting-times.json"
        );
    }
}

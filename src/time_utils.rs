//! Timezone resolution, timestamp parsing and query-window handling
//!
//! Everything here is pure: the caller injects "now", so default windows
//! and month expansion are deterministic and testable.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Days covered by the default query window when no bounds are given
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// Errors raised while resolving timezones, timestamps or the query window
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Unrecognized datetime format: '{0}'")]
    InvalidTimeExpression(String),

    #[error("Invalid duration '{0}': expected [DD-]HH:MM:SS")]
    InvalidDuration(String),

    #[error("Invalid window: start {start} is not before end {end}")]
    InvalidWindow { start: String, end: String },
}

pub type Result<T> = std::result::Result<T, WindowError>;

/// A resolved, timezone-aware, half-open query interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub tz: Tz,
}

/// Resolve an IANA timezone name, falling back to the host zone
///
/// With `None` the host timezone is used; if the host zone cannot be
/// determined or parsed the window falls back to UTC.
pub fn resolve_timezone(name: Option<&str>) -> Result<Tz> {
    match name {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| WindowError::UnknownTimezone(name.to_string())),
        None => {
            let host = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
            Ok(host.parse::<Tz>().unwrap_or(chrono_tz::UTC))
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

fn localize(naive: NaiveDateTime, tz: Tz, original: &str) -> Result<DateTime<Tz>> {
    // a time skipped by a DST transition has no valid local representation
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| WindowError::InvalidTimeExpression(original.to_string()))
}

/// Parse a Slurm-style timestamp and attach it to `tz`
///
/// Accepts ISO-8601 timestamps with `T` or space separators, the common
/// variants without seconds, and date-only values (interpreted as
/// midnight). Strings carrying an explicit UTC offset are converted
/// into `tz`.
pub fn parse_datetime(value: &str, tz: Tz) -> Result<DateTime<Tz>> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WindowError::InvalidTimeExpression(value.to_string()));
    }

    if let Ok(aware) = DateTime::parse_from_rfc3339(value) {
        return Ok(aware.with_timezone(&tz));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return localize(naive, tz, value);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return localize(date.and_time(NaiveTime::MIN), tz, value);
        }
    }

    Err(WindowError::InvalidTimeExpression(value.to_string()))
}

/// Which window bound an expression belongs to; decides how a bare
/// `YYYY-MM` month expands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

fn month_re() -> &'static Regex {
    static MONTH_RE: OnceLock<Regex> = OnceLock::new();
    MONTH_RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("valid month regex"))
}

/// First instant of the month `month0` months after January of `year`
fn month_start(year: i32, month0: u32, tz: Tz, original: &str) -> Result<DateTime<Tz>> {
    let year = year + (month0 / 12) as i32;
    let month = month0 % 12 + 1;
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| WindowError::InvalidTimeExpression(original.to_string()))?;
    localize(date.and_time(NaiveTime::MIN), tz, original)
}

/// Expand a bare `YYYY-MM` expression, or `None` if it is not one
///
/// As a start bound the month expands to its first instant; as an end
/// bound to the first instant of the following month, keeping the window
/// half-open.
fn expand_month(expr: &str, bound: Bound, tz: Tz) -> Option<Result<DateTime<Tz>>> {
    let caps = month_re().captures(expr)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&month) {
        return Some(Err(WindowError::InvalidTimeExpression(expr.to_string())));
    }
    let month0 = match bound {
        Bound::Start => month - 1,
        Bound::End => month,
    };
    Some(month_start(year, month0, tz, expr))
}

fn parse_bound(expr: &str, bound: Bound, tz: Tz) -> Result<DateTime<Tz>> {
    let expr = expr.trim();
    if let Some(resolved) = expand_month(expr, bound, tz) {
        return resolved;
    }
    parse_datetime(expr, tz)
}

/// Resolve the query window from optional CLI expressions
///
/// `now` carries the target timezone and is injected by the caller. With
/// no bounds the window covers the last [`DEFAULT_WINDOW_DAYS`] days up to
/// `now`. A bare `YYYY-MM` start with no explicit end selects exactly that
/// month.
pub fn resolve_window(
    start_expr: Option<&str>,
    end_expr: Option<&str>,
    now: DateTime<Tz>,
) -> Result<TimeWindow> {
    let tz = now.timezone();

    let start = match start_expr {
        Some(expr) => parse_bound(expr, Bound::Start, tz)?,
        None => now - Duration::days(DEFAULT_WINDOW_DAYS),
    };

    let end = match end_expr {
        Some(expr) => parse_bound(expr, Bound::End, tz)?,
        None => match start_expr.map(str::trim) {
            Some(expr) if month_re().is_match(expr) => parse_bound(expr, Bound::End, tz)?,
            _ => now,
        },
    };

    if start >= end {
        return Err(WindowError::InvalidWindow {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }

    Ok(TimeWindow { start, end, tz })
}

fn duration_re() -> &'static Regex {
    static DURATION_RE: OnceLock<Regex> = OnceLock::new();
    DURATION_RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)-)?(\d+):([0-5]?\d):([0-5]?\d)$").expect("valid duration regex")
    })
}

/// Parse a Slurm `[DD-]HH:MM:SS` duration into seconds
///
/// Hours are unbounded; minutes and seconds must stay below 60.
pub fn parse_duration_to_seconds(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let caps = duration_re()
        .captures(trimmed)
        .ok_or_else(|| WindowError::InvalidDuration(value.to_string()))?;

    let days: f64 = caps.get(1).map_or(0.0, |m| m.as_str().parse().unwrap_or(0.0));
    let hours: f64 = caps[2].parse().unwrap_or(0.0);
    let minutes: f64 = caps[3].parse().unwrap_or(0.0);
    let seconds: f64 = caps[4].parse().unwrap_or(0.0);

    Ok(days * 86_400.0 + hours * 3_600.0 + minutes * 60.0 + seconds)
}

/// Format a duration in seconds as `HH:MM:SS`; hours may exceed 24
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.round() as i64;
    let hours = total / 3_600;
    let minutes = total % 3_600 / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

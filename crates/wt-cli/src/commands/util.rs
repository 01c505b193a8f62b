//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveTime, TimeZone,
};
use regex::Regex;
use wt_core::DateRange;

use crate::Config;
use crate::cli::RangeArgs;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative date parsing (~1000 years in days).
const MAX_RELATIVE_DAYS: i64 = 1000 * 366;

/// Parse a date argument relative to `today`.
///
/// Supports:
/// - ISO 8601: "2025-01-15"
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, 'today', 'yesterday' or relative (e.g., '2 weeks ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let days_per_unit = match &caps[2] {
        "day" => 1,
        "week" => 7,
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    today
        .checked_sub_signed(Duration::days(n * days_per_unit))
        .with_context(|| format!("date out of range: {s}"))
}

/// Resolves `--from`/`--to` into a validated range.
///
/// `--from` falls back to the configured start date, then to the first day
/// of the current month; `--to` falls back to today.
pub fn resolve_range(args: &RangeArgs, config: &Config, today: NaiveDate) -> anyhow::Result<DateRange> {
    let start = match &args.from {
        Some(from) => parse_date(from, today)?,
        None => config
            .start_date
            .unwrap_or_else(|| today.with_day(1).unwrap_or(today)),
    };
    let end = match &args.to {
        Some(to) => parse_date(to, today)?,
        None => today,
    };
    Ok(DateRange::new(start, end)?)
}

/// Converts a local date at midnight to an instant.
/// Handles DST ambiguity by picking the earlier time.
pub fn local_midnight(local_date: NaiveDate) -> DateTime<FixedOffset> {
    let midnight = local_date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.fixed_offset(),
        LocalResult::None => {
            // DST spring-forward gap at midnight is rare but possible
            // Use 1am local which exists in every zone we know of
            let one_am = midnight + Duration::hours(1);
            Local
                .from_local_datetime(&one_am)
                .earliest()
                .unwrap_or_else(|| Local.from_utc_datetime(&one_am))
                .fixed_offset()
        }
    }
}

/// Formats a duration as "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations get a leading minus; seconds are truncated.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();
    let sign = if total_minutes < 0 { "-" } else { "" };
    let total_minutes = total_minutes.abs();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{sign}{hours}h {minutes}m")
    } else {
        format!("{sign}{minutes}m")
    }
}

/// Like [`format_duration`] but always shows the sign of non-zero values.
pub fn format_signed(duration: Duration) -> String {
    if duration.num_minutes() > 0 {
        format!("+{}", format_duration(duration))
    } else {
        format_duration(duration)
    }
}

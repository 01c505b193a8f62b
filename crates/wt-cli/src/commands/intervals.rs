//! Intervals command: shows the work sessions behind a report.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use wt_core::{IntervalBuilder, WorkInterval};

use super::util::{format_duration, resolve_range};
use crate::cli::RangeArgs;
use crate::{Config, pipeline, source};

/// A single interval in JSON output.
#[derive(Debug, Serialize)]
pub struct JsonInterval {
    pub date: String,
    pub start: String,
    pub end: String,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// End time of day; a segment that runs to the next midnight shows `24:00`.
fn end_time(interval: &WorkInterval) -> String {
    if interval.end().date_naive() == interval.day() {
        interval.end().format("%H:%M").to_string()
    } else {
        "24:00".to_string()
    }
}

fn row(output: &mut String, date: &str, start: &str, end: &str, duration: &str, label: &str) {
    let line = format!("{date:<10}  {start:<5}  {end:<5}  {duration:>8}  {label}");
    writeln!(output, "{}", line.trim_end()).unwrap();
}

/// Formats intervals as a table.
pub fn format_intervals(intervals: &[WorkInterval]) -> String {
    let mut output = String::new();

    if intervals.is_empty() {
        writeln!(output, "No work intervals in range.").unwrap();
        return output;
    }

    row(&mut output, "DATE", "START", "END", "DURATION", "LABEL");
    for interval in intervals {
        row(
            &mut output,
            &interval.day().to_string(),
            &interval.start().format("%H:%M").to_string(),
            &end_time(interval),
            &format_duration(interval.duration()),
            interval.label().unwrap_or(""),
        );
    }

    let total = intervals
        .iter()
        .fold(chrono::Duration::zero(), |acc, i| acc + i.duration());
    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {} intervals, {}",
        intervals.len(),
        format_duration(total)
    )
    .unwrap();

    output
}

/// Formats intervals as JSON.
pub fn format_intervals_json(intervals: &[WorkInterval]) -> Result<String> {
    let json: Vec<JsonInterval> = intervals
        .iter()
        .map(|i| JsonInterval {
            date: i.day().to_string(),
            start: i.start().to_rfc3339(),
            end: i.end().to_rfc3339(),
            duration_ms: i.duration().num_milliseconds(),
            label: i.label().map(String::from),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Runs the intervals command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    range_args: &RangeArgs,
    json: bool,
    now: DateTime<FixedOffset>,
) -> Result<()> {
    let range = resolve_range(range_args, config, now.date_naive())?;
    let source = source::from_config(config);
    let builder = IntervalBuilder::new(config.open_session);
    let intervals = pipeline::collect_intervals(source.as_ref(), &builder, &range, now)?;

    if json {
        writeln!(writer, "{}", format_intervals_json(&intervals)?)?;
    } else {
        write!(writer, "{}", format_intervals(&intervals))?;
    }

    Ok(())
}

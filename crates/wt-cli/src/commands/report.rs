//! Report command for overtime accounting.
//!
//! This module implements `wtrack report` with per-day, per-week or
//! per-month rows and output formats (human-readable, JSON).

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;
use wt_core::{Accumulation, DateRange, DayKind, EventSource, summarize};

use super::util::{format_duration, format_signed, resolve_range};
use crate::cli::{GroupBy, RangeArgs};
use crate::{Config, pipeline, source};

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<FixedOffset>,
    pub range: DateRange,
    pub group_by: GroupBy,
    pub accumulation: Accumulation,
}

// ========== Report Generation ==========

/// Runs the accounting pipeline for `range`.
pub fn generate_report_data(
    source: &dyn EventSource,
    config: &Config,
    range: DateRange,
    group_by: GroupBy,
    now: DateTime<FixedOffset>,
) -> Result<ReportData> {
    let accumulation = pipeline::account(source, config, &range, now)?;
    Ok(ReportData {
        generated_at: now,
        range,
        group_by,
        accumulation,
    })
}

/// Milliseconds, the unit of all JSON durations.
fn ms(duration: Duration) -> i64 {
    duration.num_milliseconds()
}

fn day_row(
    output: &mut String,
    columns: [&str; 3],
    worked: &str,
    expected: &str,
    delta: &str,
    balance: &str,
) {
    let [date, day, kind] = columns;
    writeln!(
        output,
        "{date:<10}  {day:<3}  {kind:<9}  {worked:>8}  {expected:>8}  {delta:>8}  {balance:>8}"
    )
    .unwrap();
}

fn period_row(
    output: &mut String,
    label: &str,
    dates: &str,
    worked: &str,
    expected: &str,
    delta: &str,
    balance: &str,
) {
    writeln!(
        output,
        "{label:<10}  {dates:<22}  {worked:>8}  {expected:>8}  {delta:>8}  {balance:>8}"
    )
    .unwrap();
}

/// Writes a rule as wide as the last line of `output`.
fn underline(output: &mut String) {
    let width = output
        .trim_end_matches('\n')
        .lines()
        .last()
        .map_or(0, |line| line.chars().count());
    writeln!(output, "{}", "─".repeat(width)).unwrap();
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "OVERTIME REPORT: {} to {}",
        data.range.start(),
        data.range.end()
    )
    .unwrap();
    writeln!(output).unwrap();

    match data.group_by.granularity() {
        None => {
            day_row(
                &mut output,
                ["DATE", "DAY", "KIND"],
                "WORKED",
                "EXPECTED",
                "DELTA",
                "BALANCE",
            );
            underline(&mut output);
            for record in &data.accumulation.records {
                day_row(
                    &mut output,
                    [
                        &record.date.to_string(),
                        &record.date.format("%a").to_string(),
                        &record.kind.to_string(),
                    ],
                    &format_duration(record.worked),
                    &format_duration(record.expected),
                    &format_signed(record.delta),
                    &format_signed(record.balance),
                );
            }
        }
        Some(granularity) => {
            period_row(
                &mut output,
                "PERIOD",
                "DATES",
                "WORKED",
                "EXPECTED",
                "DELTA",
                "BALANCE",
            );
            underline(&mut output);
            for period in summarize(&data.accumulation.records, granularity) {
                period_row(
                    &mut output,
                    &period.label,
                    &format!("{}..{}", period.first, period.last),
                    &format_duration(period.worked),
                    &format_duration(period.expected),
                    &format_signed(period.delta),
                    &format_signed(period.balance),
                );
            }
        }
    }

    // SUMMARY section
    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Days:      {}", data.accumulation.records.len()).unwrap();
    writeln!(
        output,
        "Worked:    {}",
        format_duration(data.accumulation.total_worked())
    )
    .unwrap();
    writeln!(
        output,
        "Expected:  {}",
        format_duration(data.accumulation.total_expected())
    )
    .unwrap();
    writeln!(
        output,
        "Balance:   {}",
        format_signed(data.accumulation.balance)
    )
    .unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub period: JsonPeriod,
    pub days: Vec<JsonDay>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub periods: Vec<JsonPeriodSummary>,
    pub totals: JsonTotals,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct JsonDay {
    pub date: String,
    pub kind: DayKind,
    pub worked_ms: i64,
    pub expected_ms: i64,
    pub delta_ms: i64,
    pub balance_ms: i64,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriodSummary {
    pub label: String,
    pub start: String,
    pub end: String,
    pub worked_ms: i64,
    pub expected_ms: i64,
    pub delta_ms: i64,
    pub balance_ms: i64,
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub days: usize,
    pub worked_ms: i64,
    pub expected_ms: i64,
    pub balance_ms: i64,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let records = &data.accumulation.records;

    let periods: Vec<JsonPeriodSummary> = data
        .group_by
        .granularity()
        .map(|granularity| {
            summarize(records, granularity)
                .into_iter()
                .map(|p| JsonPeriodSummary {
                    label: p.label,
                    start: p.first.to_string(),
                    end: p.last.to_string(),
                    worked_ms: ms(p.worked),
                    expected_ms: ms(p.expected),
                    delta_ms: ms(p.delta),
                    balance_ms: ms(p.balance),
                })
                .collect()
        })
        .unwrap_or_default();

    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        period: JsonPeriod {
            start: data.range.start().to_string(),
            end: data.range.end().to_string(),
        },
        days: records
            .iter()
            .map(|r| JsonDay {
                date: r.date.to_string(),
                kind: r.kind,
                worked_ms: ms(r.worked),
                expected_ms: ms(r.expected),
                delta_ms: ms(r.delta),
                balance_ms: ms(r.balance),
            })
            .collect(),
        periods,
        totals: JsonTotals {
            days: records.len(),
            worked_ms: ms(data.accumulation.total_worked()),
            expected_ms: ms(data.accumulation.total_expected()),
            balance_ms: ms(data.accumulation.balance),
        },
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    range_args: &RangeArgs,
    group_by: GroupBy,
    json: bool,
    now: DateTime<FixedOffset>,
) -> Result<()> {
    let range = resolve_range(range_args, config, now.date_naive())?;
    let source = source::from_config(config);
    let data = generate_report_data(source.as_ref(), config, range, group_by, now)?;

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }

    Ok(())
}

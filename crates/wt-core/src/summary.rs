//! Week and month roll-ups of day records.

use chrono::{Datelike, Duration, NaiveDate};

use crate::accumulate::DayRecord;

/// Period length for [`summarize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// ISO week, Monday to Sunday.
    Week,
    Month,
}

/// Totals over consecutive day records sharing a week or month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    /// `2025-W03` or `2025-01`.
    pub label: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub worked: Duration,
    pub expected: Duration,
    pub delta: Duration,
    /// Cumulative balance at the end of the period.
    pub balance: Duration,
}

fn period_label(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Week => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
    }
}

/// Groups date-ordered records into periods.
///
/// Partial periods at either end of the range are kept as they are.
pub fn summarize(records: &[DayRecord], granularity: Granularity) -> Vec<PeriodSummary> {
    let mut summaries: Vec<PeriodSummary> = Vec::new();

    for record in records {
        let label = period_label(record.date, granularity);
        match summaries.last_mut() {
            Some(current) if current.label == label => {
                current.last = record.date;
                current.worked = current.worked + record.worked;
                current.expected = current.expected + record.expected;
                current.delta = current.delta + record.delta;
                current.balance = record.balance;
            }
            _ => summaries.push(PeriodSummary {
                label,
                first: record.date,
                last: record.date,
                worked: record.worked,
                expected: record.expected,
                delta: record.delta,
                balance: record.balance,
            }),
        }
    }

    summaries
}

//! Overtime accounting.
//!
//! Folds per-day worked time against the [`ScheduleModel`] into one
//! [`DayRecord`] per date of the queried range. The running balance on each
//! record is the sum of all deltas up to and including that date.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::error::AccountingError;
use crate::interval::WorkInterval;
use crate::range::DateRange;
use crate::schedule::{DayKind, ScheduleModel};

/// Accounting result for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub kind: DayKind,
    /// Sum of the day's work intervals.
    pub worked: Duration,
    pub expected: Duration,
    /// `worked - expected`.
    pub delta: Duration,
    /// Cumulative delta up to and including `date`.
    pub balance: Duration,
}

/// All day records of a range plus the final balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulation {
    pub records: Vec<DayRecord>,
    pub balance: Duration,
}

impl Accumulation {
    pub fn total_worked(&self) -> Duration {
        self.records
            .iter()
            .fold(Duration::zero(), |acc, r| acc + r.worked)
    }

    pub fn total_expected(&self) -> Duration {
        self.records
            .iter()
            .fold(Duration::zero(), |acc, r| acc + r.expected)
    }
}

/// Computes the per-day breakdown and running balance for `range`.
///
/// Intervals must be disjoint and lie inside `range`.
pub fn accumulate(
    intervals: &[WorkInterval],
    schedule: &ScheduleModel,
    range: &DateRange,
) -> Result<Accumulation, AccountingError> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&WorkInterval>> = BTreeMap::new();
    for interval in intervals {
        if !range.contains(interval.day()) {
            return Err(AccountingError::DateOutOfCalendarSourceCoverage {
                date: interval.day(),
                start: range.start(),
                end: range.end(),
            });
        }
        by_day.entry(interval.day()).or_default().push(interval);
    }

    for (date, day_intervals) in &mut by_day {
        ensure_disjoint(*date, day_intervals)?;
    }

    let mut balance = Duration::zero();
    let records: Vec<DayRecord> = range
        .days()
        .map(|date| {
            let worked = by_day.get(&date).map_or_else(Duration::zero, |day| {
                day.iter().fold(Duration::zero(), |acc, i| acc + i.duration())
            });
            let expected = schedule.expected_duration(date);
            let delta = worked - expected;
            balance = balance + delta;
            DayRecord {
                date,
                kind: schedule.day_kind(date),
                worked,
                expected,
                delta,
                balance,
            }
        })
        .collect();

    tracing::debug!(
        days = records.len(),
        intervals = intervals.len(),
        balance_minutes = balance.num_minutes(),
        "accumulated overtime"
    );

    Ok(Accumulation { records, balance })
}

fn ensure_disjoint(date: NaiveDate, intervals: &mut [&WorkInterval]) -> Result<(), AccountingError> {
    intervals.sort_by_key(|i| i.start());
    for pair in intervals.windows(2) {
        if pair[1].start() < pair[0].end() {
            return Err(AccountingError::OverlappingIntervals {
                date,
                first: pair[0].clone(),
                second: pair[1].clone(),
            });
        }
    }
    Ok(())
}

//! Accounting error taxonomy.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Weekday};
use thiserror::Error;

use crate::interval::WorkInterval;

/// Errors raised while turning events into a balance.
///
/// Every variant is terminal for the computation that raised it: the first
/// violation aborts and no partial balance is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountingError {
    /// Events were not sorted ascending by timestamp.
    #[error("events are not sorted: {current} follows {previous}")]
    UnsortedInput {
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },

    /// Start and end events could not be paired.
    #[error("malformed event sequence at {at}: {reason}")]
    MalformedSequence {
        at: DateTime<FixedOffset>,
        reason: &'static str,
    },

    /// A session was started but never ended.
    #[error("work session started at {start} has no end")]
    UnmatchedStart { start: DateTime<FixedOffset> },

    /// Two intervals on the same day overlap.
    #[error("overlapping work intervals on {date}: {first} and {second}")]
    OverlappingIntervals {
        date: NaiveDate,
        first: WorkInterval,
        second: WorkInterval,
    },

    /// The weekday schedule does not cover all seven days.
    #[error("schedule is missing weekdays: {}", format_weekdays(.missing))]
    IncompleteSchedule { missing: Vec<Weekday> },

    /// A configured expectation is below zero.
    #[error("expected duration for {day} is negative ({} min)", .duration.num_minutes())]
    NegativeExpectation { day: String, duration: Duration },

    /// The requested range ends before it starts.
    #[error("empty date range: {start} is after {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    /// An interval lies outside the declared accounting window.
    #[error("interval on {date} lies outside the requested range {start}..={end}")]
    DateOutOfCalendarSourceCoverage {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
}

fn format_weekdays(days: &[Weekday]) -> String {
    days.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Pairing of start/end events into per-day work intervals.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::AccountingError;
use crate::event::{EventKind, RawEvent};

/// A closed span of work that lies within a single calendar day.
///
/// The end may be the following midnight, but never later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkInterval {
    day: NaiveDate,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    label: Option<String>,
}

impl WorkInterval {
    /// Creates an interval, checking that it is non-empty and does not cross
    /// midnight in the offset of `start`.
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        label: Option<String>,
    ) -> Result<Self, AccountingError> {
        if end <= start {
            return Err(AccountingError::MalformedSequence {
                at: start,
                reason: "interval does not end after it starts",
            });
        }
        if end > next_midnight(start)? {
            return Err(AccountingError::MalformedSequence {
                at: start,
                reason: "interval crosses midnight",
            });
        }
        Ok(Self {
            day: start.date_naive(),
            start,
            end: end.with_timezone(start.offset()),
            label,
        })
    }

    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    pub const fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub const fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for WorkInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}

/// What to do with a start event that is never followed by an end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenSessionPolicy {
    /// Close the session at the query's end boundary.
    #[default]
    CapAtQueryEnd,
    /// Fail with [`AccountingError::UnmatchedStart`].
    Reject,
}

/// Turns a sorted event stream into work intervals.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalBuilder {
    policy: OpenSessionPolicy,
}

impl IntervalBuilder {
    pub const fn new(policy: OpenSessionPolicy) -> Self {
        Self { policy }
    }

    pub const fn policy(&self) -> OpenSessionPolicy {
        self.policy
    }

    /// Pairs `events` into intervals, splitting pairs at local midnight.
    ///
    /// `open_until` is the query's end boundary. A trailing unmatched start
    /// is closed there under [`OpenSessionPolicy::CapAtQueryEnd`].
    pub fn build(
        &self,
        events: &[RawEvent],
        open_until: DateTime<FixedOffset>,
    ) -> Result<Vec<WorkInterval>, AccountingError> {
        let mut intervals = Vec::new();
        let mut open: Option<&RawEvent> = None;
        let mut previous: Option<DateTime<FixedOffset>> = None;

        for event in events {
            if let Some(previous) = previous {
                if event.timestamp < previous {
                    return Err(AccountingError::UnsortedInput {
                        previous,
                        current: event.timestamp,
                    });
                }
            }
            previous = Some(event.timestamp);

            match (event.kind, open) {
                (EventKind::Start, None) => open = Some(event),
                (EventKind::Start, Some(_)) => {
                    return Err(AccountingError::MalformedSequence {
                        at: event.timestamp,
                        reason: "start while a session is already open",
                    });
                }
                (EventKind::End, Some(start)) => {
                    push_split(&mut intervals, start, event.timestamp)?;
                    open = None;
                }
                (EventKind::End, None) => {
                    return Err(AccountingError::MalformedSequence {
                        at: event.timestamp,
                        reason: "end without a preceding start",
                    });
                }
            }
        }

        if let Some(start) = open {
            match self.policy {
                OpenSessionPolicy::CapAtQueryEnd if open_until > start.timestamp => {
                    tracing::debug!(start = %start.timestamp, end = %open_until, "closing open session at query end");
                    push_split(&mut intervals, start, open_until)?;
                }
                _ => {
                    return Err(AccountingError::UnmatchedStart {
                        start: start.timestamp,
                    });
                }
            }
        }

        Ok(intervals)
    }
}

/// Appends one interval per calendar day touched by `start..end`.
fn push_split(
    intervals: &mut Vec<WorkInterval>,
    start: &RawEvent,
    end: DateTime<FixedOffset>,
) -> Result<(), AccountingError> {
    let end = end.with_timezone(start.timestamp.offset());
    if end == start.timestamp {
        tracing::debug!(at = %end, "skipping zero-length session");
        return Ok(());
    }

    let mut segment_start = start.timestamp;
    while segment_start < end {
        let segment_end = end.min(next_midnight(segment_start)?);
        intervals.push(WorkInterval {
            day: segment_start.date_naive(),
            start: segment_start,
            end: segment_end,
            label: start.label.clone(),
        });
        segment_start = segment_end;
    }
    Ok(())
}

fn next_midnight(ts: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>, AccountingError> {
    ts.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| ts.offset().from_local_datetime(&midnight).single())
        .ok_or(AccountingError::MalformedSequence {
            at: ts,
            reason: "timestamp out of supported range",
        })
}

//! Overtime accounting engine.
//!
//! This crate turns calendar events into a running overtime balance:
//! - Events: timestamped start/end markers supplied by an [`EventSource`]
//! - Intervals: start/end pairs split into per-day [`WorkInterval`]s
//! - Schedule: expected working time per weekday with per-date overrides
//! - Accumulation: one [`DayRecord`] per date with a cumulative balance

mod accumulate;
mod error;
pub mod event;
pub mod interval;
mod range;
pub mod schedule;
pub mod summary;

pub use accumulate::{Accumulation, DayRecord, accumulate};
pub use error::AccountingError;
pub use event::{EventKind, EventSource, RawEvent, SourceError, UnknownEventKind, sort_events};
pub use interval::{IntervalBuilder, OpenSessionPolicy, WorkInterval};
pub use range::DateRange;
pub use schedule::{DayKind, DayOverride, ScheduleModel, WEEKDAYS};
pub use summary::{Granularity, PeriodSummary, summarize};

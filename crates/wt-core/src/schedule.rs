//! Expected working time per calendar day.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::AccountingError;

/// All weekdays, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A per-date replacement for the weekday expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOverride {
    /// No work is expected.
    Holiday,
    /// A special workload replaces the weekday default.
    Exception(Duration),
}

/// How a day's expectation was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Workday,
    Off,
    Holiday,
    Exception,
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Workday => "workday",
            Self::Off => "off",
            Self::Holiday => "holiday",
            Self::Exception => "exception",
        };
        write!(f, "{s}")
    }
}

/// Immutable expected-hours model: one duration per weekday plus per-date
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleModel {
    weekdays: [Duration; 7],
    overrides: BTreeMap<NaiveDate, DayOverride>,
}

impl ScheduleModel {
    /// Builds a schedule. Every weekday must be given; a later entry for the
    /// same weekday replaces an earlier one.
    pub fn new(
        weekdays: impl IntoIterator<Item = (Weekday, Duration)>,
        overrides: BTreeMap<NaiveDate, DayOverride>,
    ) -> Result<Self, AccountingError> {
        let mut slots: [Option<Duration>; 7] = [None; 7];
        for (weekday, duration) in weekdays {
            if duration < Duration::zero() {
                return Err(AccountingError::NegativeExpectation {
                    day: weekday.to_string(),
                    duration,
                });
            }
            slots[weekday.num_days_from_monday() as usize] = Some(duration);
        }

        let missing: Vec<Weekday> = WEEKDAYS
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(day, _)| *day)
            .collect();
        if !missing.is_empty() {
            return Err(AccountingError::IncompleteSchedule { missing });
        }

        for (date, day_override) in &overrides {
            if let DayOverride::Exception(duration) = day_override {
                if *duration < Duration::zero() {
                    return Err(AccountingError::NegativeExpectation {
                        day: date.to_string(),
                        duration: *duration,
                    });
                }
            }
        }

        Ok(Self {
            weekdays: slots.map(|slot| slot.unwrap_or_else(Duration::zero)),
            overrides,
        })
    }

    /// Monday to Friday 8h, weekends free, no overrides.
    pub fn standard() -> Self {
        let day = Duration::hours(8);
        Self {
            weekdays: [day, day, day, day, day, Duration::zero(), Duration::zero()],
            overrides: BTreeMap::new(),
        }
    }

    /// Expected working time on `date`.
    pub fn expected_duration(&self, date: NaiveDate) -> Duration {
        match self.overrides.get(&date) {
            Some(DayOverride::Holiday) => Duration::zero(),
            Some(DayOverride::Exception(duration)) => *duration,
            None => self.weekday_duration(date.weekday()),
        }
    }

    /// The weekday default, ignoring overrides.
    pub fn weekday_duration(&self, weekday: Weekday) -> Duration {
        self.weekdays[weekday.num_days_from_monday() as usize]
    }

    pub fn day_kind(&self, date: NaiveDate) -> DayKind {
        match self.overrides.get(&date) {
            Some(DayOverride::Holiday) => DayKind::Holiday,
            Some(DayOverride::Exception(_)) => DayKind::Exception,
            None if self.weekday_duration(date.weekday()) == Duration::zero() => DayKind::Off,
            None => DayKind::Workday,
        }
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&NaiveDate, &DayOverride)> {
        self.overrides.iter()
    }
}

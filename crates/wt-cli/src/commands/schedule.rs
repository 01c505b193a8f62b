//! Schedule command: shows the expectation model in effect.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use wt_core::{DayKind, DayOverride, ScheduleModel, WEEKDAYS};

use super::util::format_duration;
use crate::Config;

/// Formats the weekday table and the date overrides.
///
/// `holidays` supplies descriptions for holiday overrides.
pub fn format_schedule(schedule: &ScheduleModel, holidays: &BTreeMap<NaiveDate, String>) -> String {
    let mut output = String::new();

    writeln!(output, "WEEKLY SCHEDULE").unwrap();
    writeln!(output, "───────────────").unwrap();
    let mut week = Duration::zero();
    for day in WEEKDAYS {
        let hours = schedule.weekday_duration(day);
        week = week + hours;
        writeln!(output, "{:<5}  {:>8}", day.to_string(), format_duration(hours)).unwrap();
    }
    writeln!(output, "{:<5}  {:>8}", "Total", format_duration(week)).unwrap();

    writeln!(output).unwrap();
    writeln!(output, "OVERRIDES").unwrap();
    writeln!(output, "─────────").unwrap();

    let mut overrides = schedule.overrides().peekable();
    if overrides.peek().is_none() {
        writeln!(output, "No holidays or exceptions configured.").unwrap();
        return output;
    }

    for (date, entry) in overrides {
        let (kind, hours) = match entry {
            DayOverride::Holiday => (DayKind::Holiday, Duration::zero()),
            DayOverride::Exception(hours) => (DayKind::Exception, *hours),
        };
        let description = holidays.get(date).map_or("", String::as_str);
        let line = format!(
            "{date}  {:<9}  {:>8}  {description}",
            kind.to_string(),
            format_duration(hours)
        );
        writeln!(output, "{}", line.trim_end()).unwrap();
    }

    output
}

/// Runs the schedule command.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let schedule = config.schedule_model()?;
    write!(writer, "{}", format_schedule(&schedule, &config.holidays))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_schedule_with_overrides() {
        let mut config = Config::default();
        config
            .holidays
            .insert(date(2025, 12, 25), "Christmas".to_string());
        config.exceptions.insert(date(2025, 12, 24), 4.0);

        let schedule = config.schedule_model().unwrap();
        let output = format_schedule(&schedule, &config.holidays);
        assert_snapshot!(output);
    }

    #[test]
    fn test_schedule_without_overrides() {
        let output = format_schedule(&ScheduleModel::standard(), &BTreeMap::new());
        assert!(output.contains("Total    40h 0m"));
        assert!(output.ends_with("No holidays or exceptions configured.\n"));
    }

    #[test]
    fn test_run_rejects_partial_schedule() {
        let mut config = Config::default();
        config.schedule = Some(BTreeMap::from([("monday".to_string(), 8.0)]));

        let mut out = Vec::new();
        let err = run(&mut out, &config).unwrap_err();
        assert!(format!("{err:#}").contains("schedule is missing weekdays"));
    }
}

//! iCalendar work calendars.
//!
//! Every `VEVENT` is one work session: `DTSTART` opens it and `DTEND` (or
//! `DTSTART + DURATION`) closes it. `SUMMARY` becomes the event label.
//! UTC times and times with a `TZID` parameter are converted to the local
//! offset; floating times are read as local wall-clock time.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use wt_core::{DateRange, EventSource, RawEvent, SourceError, sort_events};

/// Reads work sessions from an `.ics` file.
#[derive(Debug, Clone)]
pub struct IcsFileSource {
    path: PathBuf,
    label_filter: Option<String>,
}

impl IcsFileSource {
    pub const fn new(path: PathBuf, label_filter: Option<String>) -> Self {
        Self { path, label_filter }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

impl EventSource for IcsFileSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawEvent>, SourceError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| SourceError::Unavailable {
                location: self.location(),
                source,
            })?;
        let sessions = parse_calendar(&content).map_err(|message| SourceError::Invalid {
            location: self.location(),
            message,
        })?;
        Ok(select_events(sessions, range, self.label_filter.as_deref()))
    }
}

/// A parsed `VEVENT` with a definite start and end.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    summary: Option<String>,
}

fn parse_calendar(content: &str) -> Result<Vec<Session>, String> {
    let calendar = content.parse::<Calendar>().map_err(|e| e.to_string())?;

    let mut sessions = Vec::new();
    for component in &calendar.components {
        let CalendarComponent::Event(event) = component else {
            continue;
        };
        let uid = event.property_value("UID").unwrap_or("?");
        if let Some(session) = read_event(event).map_err(|e| format!("event {uid}: {e}"))? {
            sessions.push(session);
        }
    }
    Ok(sessions)
}

fn read_event(event: &Event) -> Result<Option<Session>, String> {
    let uid = event.property_value("UID");
    if event
        .property_value("STATUS")
        .is_some_and(|s| s.eq_ignore_ascii_case("CANCELLED"))
    {
        tracing::debug!(?uid, "skipping cancelled event");
        return Ok(None);
    }

    let start = match event.get_start() {
        Some(value) => resolve(value)?,
        None if event.property_value("DTSTART").is_some() => {
            return Err("invalid DTSTART".to_string());
        }
        None => return Err("missing DTSTART".to_string()),
    };
    let Some(start) = start else {
        tracing::debug!(?uid, "skipping all-day event");
        return Ok(None);
    };

    let end = if let Some(value) = event.get_end() {
        resolve(value)?.ok_or("DTEND is a date but DTSTART is a date-time")?
    } else if event.property_value("DTEND").is_some() {
        return Err("invalid DTEND".to_string());
    } else if let Some(duration) = event.property_value("DURATION") {
        start
            .checked_add_signed(parse_duration(duration)?)
            .ok_or_else(|| format!("invalid duration {duration}: end out of range"))?
    } else {
        start
    };

    if end < start {
        return Err("ends before it starts".to_string());
    }
    if end == start {
        tracing::debug!(?uid, "skipping zero-length event");
        return Ok(None);
    }
    Ok(Some(Session {
        start,
        end,
        summary: event.property_value("SUMMARY").map(str::to_string),
    }))
}

/// Resolves a `DATE-TIME` to the local offset. Returns `None` for dates.
fn resolve(value: DatePerhapsTime) -> Result<Option<DateTime<FixedOffset>>, String> {
    let resolved = match value {
        DatePerhapsTime::Date(_) => return Ok(None),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(utc)) => utc.with_timezone(&Local),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => earliest(&Local, naive)?,
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz: Tz = tzid
                .parse()
                .map_err(|_| format!("unknown time zone {tzid}"))?;
            earliest(&tz, date_time)?.with_timezone(&Local)
        }
    };
    Ok(Some(resolved.fixed_offset()))
}

/// Maps a wall-clock time in `tz` to an instant, the earlier one on DST
/// ambiguity.
fn earliest<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> Result<DateTime<Z>, String> {
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("nonexistent local time {naive}"))
}

/// Parses an RFC 5545 duration (`PT8H30M`, `P1D`, `P1W`, `-PT15M`).
fn parse_duration(value: &str) -> Result<TimeDelta, String> {
    let invalid = || format!("invalid duration {value}");
    let (negative, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let parsed = iso8601::duration(unsigned).map_err(|e| format!("{}: {e}", invalid()))?;
    let seconds = match parsed {
        iso8601::Duration::Weeks(weeks) => i64::from(weeks).checked_mul(7 * 86_400),
        iso8601::Duration::YMDHMS {
            year: 0,
            month: 0,
            day,
            hour,
            minute,
            second,
            millisecond: 0,
        } => i64::from(day)
            .checked_mul(86_400)
            .and_then(|s| s.checked_add(i64::from(hour) * 3_600))
            .and_then(|s| s.checked_add(i64::from(minute) * 60))
            .and_then(|s| s.checked_add(i64::from(second))),
        iso8601::Duration::YMDHMS { .. } => {
            return Err(format!("{}: only weeks, days and times are allowed", invalid()));
        }
    }
    .ok_or_else(invalid)?;

    let duration =
        TimeDelta::try_seconds(seconds).ok_or_else(|| format!("{}: out of range", invalid()))?;
    Ok(if negative { -duration } else { duration })
}

fn select_events(sessions: Vec<Session>, range: &DateRange, label_filter: Option<&str>) -> Vec<RawEvent> {
    let needle = label_filter.map(str::to_lowercase);
    let mut events = Vec::new();

    for session in sessions {
        if let Some(needle) = &needle {
            let matches = session
                .summary
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(needle.as_str()));
            if !matches {
                continue;
            }
        }
        if session.start.date_naive() > range.end() || session.end.date_naive() < range.start() {
            continue;
        }

        let mut start = RawEvent::start(session.start);
        let mut end = RawEvent::end(session.end);
        start.label.clone_from(&session.summary);
        end.label = session.summary;
        events.push(start);
        events.push(end);
    }

    sort_events(&mut events);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wt_core::EventKind;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    fn calendar(events: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n{events}END:VCALENDAR\r\n")
    }

    /// Parses a calendar holding one `VEVENT` with the given properties.
    fn single(properties: &str) -> Result<Vec<Session>, String> {
        parse_calendar(&calendar(&format!(
            "BEGIN:VEVENT\r\nUID:x\r\n{properties}END:VEVENT\r\n"
        )))
    }

    const EVENTS: &str = "BEGIN:VEVENT\r
UID:1\r
DTSTART:20250113T080000Z\r
DTEND:20250113T113000Z\r
SUMMARY:Work morning\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:2\r
DTSTART:20250113T123000Z\r
DURATION:PT4H15M\r
SUMMARY:Work afternoon\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:3\r
DTSTART;VALUE=DATE:20250114\r
DTEND;VALUE=DATE:20250115\r
SUMMARY:Vacation\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:4\r
DTSTART:20250115T080000Z\r
DTEND:20250115T090000Z\r
SUMMARY:Work (cancelled)\r
STATUS:CANCELLED\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:5\r
DTSTART:20250116T180000Z\r
DTEND:20250116T190000Z\r
SUMMARY:Dentist\r
END:VEVENT\r
";

    #[test]
    fn parses_sessions() {
        let sessions = parse_calendar(&calendar(EVENTS)).unwrap();

        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].start, ts("2025-01-13T08:00:00Z"));
        assert_eq!(sessions[0].end, ts("2025-01-13T11:30:00Z"));
        assert_eq!(sessions[0].summary.as_deref(), Some("Work morning"));
        assert_eq!(sessions[1].end, ts("2025-01-13T16:45:00Z"));
        assert_eq!(sessions[2].summary.as_deref(), Some("Dentist"));
    }

    #[test]
    fn label_filter_is_case_insensitive() {
        let sessions = parse_calendar(&calendar(EVENTS)).unwrap();
        let events = select_events(sessions, &range((2025, 1, 1), (2025, 1, 31)), Some("WORK"));

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].kind, EventKind::Start);
        assert_eq!(events[3].kind, EventKind::End);
        assert_eq!(events[3].timestamp, ts("2025-01-13T16:45:00Z"));
    }

    #[test]
    fn sessions_outside_range_are_dropped() {
        let sessions = parse_calendar(&calendar(EVENTS)).unwrap();
        let events = select_events(sessions, &range((2025, 1, 16), (2025, 1, 31)), None);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].label.as_deref(), Some("Dentist"));
    }

    #[test]
    fn tzid_is_resolved_in_its_zone() {
        let sessions = single(
            "DTSTART;TZID=America/New_York:20250113T090000\r\n\
             DTEND;TZID=America/New_York:20250113T170000\r\n",
        )
        .unwrap();
        assert_eq!(sessions[0].start, ts("2025-01-13T14:00:00Z"));
        assert_eq!(sessions[0].end, ts("2025-01-13T22:00:00Z"));
    }

    #[test]
    fn unknown_tzid_is_rejected() {
        let err = single("DTSTART;TZID=Mars/Olympus_Mons:20250113T090000\r\nDURATION:PT1H\r\n")
            .unwrap_err();
        assert_eq!(err, "event x: unknown time zone Mars/Olympus_Mons");
    }

    #[test]
    fn floating_time_is_local_wall_clock() {
        let sessions = single("DTSTART:20250113T090000\r\nDURATION:PT1H\r\n").unwrap();
        assert_eq!(
            sessions[0].start.naive_local(),
            NaiveDate::from_ymd_opt(2025, 1, 13)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn missing_dtstart_is_rejected() {
        let err = single("SUMMARY:Work\r\n").unwrap_err();
        assert_eq!(err, "event x: missing DTSTART");
    }

    #[test]
    fn malformed_dtstart_is_rejected() {
        let err = single("DTSTART:2025-01-13 08:00\r\n").unwrap_err();
        assert_eq!(err, "event x: invalid DTSTART");
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = single("DTSTART:20250113T090000Z\r\nDTEND:20250113T080000Z\r\n").unwrap_err();
        assert_eq!(err, "event x: ends before it starts");
    }

    #[test]
    fn zero_length_event_is_skipped() {
        let sessions = single("DTSTART:20250113T080000Z\r\nSUMMARY:Reminder\r\n").unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn oversized_durations_are_errors() {
        let err = single("DTSTART:20250113T080000Z\r\nDURATION:PT9999999999999999S\r\n")
            .unwrap_err();
        assert!(err.contains("invalid duration"), "{err}");

        let err = single("DTSTART:20250113T080000Z\r\nDURATION:P999999999D\r\n").unwrap_err();
        assert!(err.contains("invalid duration"), "{err}");
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("PT8H30M").unwrap(), TimeDelta::minutes(510));
        assert_eq!(parse_duration("P1D").unwrap(), TimeDelta::days(1));
        assert_eq!(parse_duration("P1W").unwrap(), TimeDelta::weeks(1));
        assert_eq!(parse_duration("-PT15M").unwrap(), TimeDelta::minutes(-15));
        assert_eq!(parse_duration("PT45S").unwrap(), TimeDelta::seconds(45));
        assert!(parse_duration("P1M").is_err());
        assert!(parse_duration("8 hours").is_err());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let source = IcsFileSource::new(PathBuf::from("/nonexistent/wtrack/work.ics"), None);
        let err = source
            .fetch(&range((2025, 1, 13), (2025, 1, 13)))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn malformed_event_names_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("work.ics");
        std::fs::write(&path, calendar("BEGIN:VEVENT\r\nUID:x\r\nEND:VEVENT\r\n")).unwrap();

        let err = IcsFileSource::new(path, None)
            .fetch(&range((2025, 1, 13), (2025, 1, 13)))
            .unwrap_err();
        assert!(matches!(err, SourceError::Invalid { .. }));
        assert!(err.to_string().ends_with("work.ics: event x: missing DTSTART"), "{err}");
    }
}

//! Calendar to accounting pipeline shared by the commands.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use wt_core::{Accumulation, DateRange, EventSource, IntervalBuilder, WorkInterval, accumulate};

use crate::Config;
use crate::commands::util::local_midnight;

/// Where an open session is closed: now, but never past the range end.
pub fn open_until(range: &DateRange, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let range_end = range.end().succ_opt().map_or(now, local_midnight);
    now.min(range_end)
}

/// Fetches events for `range` and pairs them into intervals.
///
/// Segments that fall outside the range (sessions spilling over either end)
/// are dropped.
pub fn collect_intervals(
    source: &dyn EventSource,
    builder: &IntervalBuilder,
    range: &DateRange,
    now: DateTime<FixedOffset>,
) -> Result<Vec<WorkInterval>> {
    let events = source.fetch(range).context("failed to read calendar")?;
    tracing::debug!(events = events.len(), "fetched calendar events");

    let intervals = builder
        .build(&events, open_until(range, now))
        .context("failed to derive work intervals")?;

    let total = intervals.len();
    let intervals: Vec<WorkInterval> = intervals
        .into_iter()
        .filter(|i| range.contains(i.day()))
        .collect();
    if intervals.len() < total {
        tracing::debug!(
            dropped = total - intervals.len(),
            "dropped interval segments outside the range"
        );
    }

    Ok(intervals)
}

/// Runs the full accounting for `range`.
pub fn account(
    source: &dyn EventSource,
    config: &Config,
    range: &DateRange,
    now: DateTime<FixedOffset>,
) -> Result<Accumulation> {
    let schedule = config.schedule_model()?;
    let builder = IntervalBuilder::new(config.open_session);
    let intervals = collect_intervals(source, &builder, range, now)?;
    let accumulation =
        accumulate(&intervals, &schedule, range).context("failed to compute overtime")?;
    Ok(accumulation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use wt_core::{AccountingError, OpenSessionPolicy, RawEvent, SourceError};

    struct FixedSource(Vec<RawEvent>);

    impl EventSource for FixedSource {
        fn fetch(&self, _range: &DateRange) -> Result<Vec<RawEvent>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    impl EventSource for BrokenSource {
        fn fetch(&self, _range: &DateRange) -> Result<Vec<RawEvent>, SourceError> {
            Err(SourceError::Parse {
                location: "broken.ics".to_string(),
                line: 7,
                message: "bad line".to_string(),
            })
        }
    }

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_until_never_exceeds_now() {
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();
        let now = ts("2025-01-13T10:00:00Z");
        assert_eq!(open_until(&range, now), now);
    }

    #[test]
    fn open_until_stops_at_range_end() {
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();
        let now = ts("2030-01-01T00:00:00Z");
        let end = open_until(&range, now);
        assert!(end < now);
        assert_eq!(end, local_midnight(date(2025, 1, 14)));
    }

    #[test]
    fn spillover_segments_are_dropped() {
        let source = FixedSource(vec![
            RawEvent::start(ts("2025-01-12T22:00:00+01:00")),
            RawEvent::end(ts("2025-01-13T02:00:00+01:00")),
        ]);
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();

        let intervals = collect_intervals(
            &source,
            &IntervalBuilder::default(),
            &range,
            ts("2030-01-01T00:00:00Z"),
        )
        .unwrap();

        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].duration(), Duration::hours(2));
    }

    #[test]
    fn account_runs_the_whole_pipeline() {
        let source = FixedSource(vec![
            RawEvent::start(ts("2025-01-13T09:00:00+01:00")),
            RawEvent::end(ts("2025-01-13T17:30:00+01:00")),
        ]);
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();

        let result = account(
            &source,
            &Config::default(),
            &range,
            ts("2030-01-01T00:00:00Z"),
        )
        .unwrap();

        assert_eq!(result.balance, Duration::minutes(30));
    }

    #[test]
    fn source_errors_propagate_unchanged() {
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();
        let err = account(
            &BrokenSource,
            &Config::default(),
            &range,
            ts("2030-01-01T00:00:00Z"),
        )
        .unwrap_err();

        let source_err = err.downcast_ref::<SourceError>().unwrap();
        assert!(matches!(source_err, SourceError::Parse { line: 7, .. }));
    }

    #[test]
    fn rejected_open_session_fails() {
        let source = FixedSource(vec![RawEvent::start(ts("2025-01-13T09:00:00+01:00"))]);
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();
        let config = Config {
            open_session: OpenSessionPolicy::Reject,
            ..Config::default()
        };

        let err = account(&source, &config, &range, ts("2030-01-01T00:00:00Z")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AccountingError>(),
            Some(AccountingError::UnmatchedStart { .. })
        ));
    }

    #[test]
    fn session_ending_after_range_counts_under_reject() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"timestamp":"2025-01-13T23:00:00+01:00","kind":"start"}
{"timestamp":"2025-01-14T01:00:00+01:00","kind":"end"}
{"timestamp":"2025-01-20T09:00:00+01:00","kind":"start"}
{"timestamp":"2025-01-20T17:00:00+01:00","kind":"end"}
"#,
        )
        .unwrap();
        let source = crate::source::JsonlFileSource::new(file.path().to_path_buf(), None);
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 13)).unwrap();
        let config = Config {
            open_session: OpenSessionPolicy::Reject,
            ..Config::default()
        };

        let result = account(&source, &config, &range, ts("2030-01-01T00:00:00Z")).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].worked, Duration::hours(1));
    }
}

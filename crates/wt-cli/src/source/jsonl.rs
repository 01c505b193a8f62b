//! Events stored one JSON object per line.

use std::path::PathBuf;

use wt_core::{DateRange, EventKind, EventSource, RawEvent, SourceError};

/// Reads `{"timestamp": ..., "kind": "start"|"end", "label": ...}` lines.
///
/// Events after the range are dropped, except the end closing a session
/// still open at the range end. Earlier events are kept so that a session
/// opened before the range still pairs with its end. With a label filter,
/// only sessions whose start label matches are kept.
#[derive(Debug, Clone)]
pub struct JsonlFileSource {
    path: PathBuf,
    label_filter: Option<String>,
}

impl JsonlFileSource {
    pub const fn new(path: PathBuf, label_filter: Option<String>) -> Self {
        Self { path, label_filter }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

impl EventSource for JsonlFileSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawEvent>, SourceError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| SourceError::Unavailable {
                location: self.location(),
                source,
            })?;
        let events = parse_events(&content, range, &self.location())?;
        Ok(match &self.label_filter {
            Some(needle) => filter_sessions(events, needle),
            None => events,
        })
    }
}

fn parse_events(
    content: &str,
    range: &DateRange,
    location: &str,
) -> Result<Vec<RawEvent>, SourceError> {
    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: RawEvent = serde_json::from_str(line).map_err(|e| SourceError::Parse {
            location: location.to_string(),
            line: index + 1,
            message: e.to_string(),
        })?;
        events.push(event);
    }

    // Stable, so events sharing a timestamp keep their file order.
    events.sort_by_key(|e| e.timestamp);

    let mut open = false;
    let cutoff = events.iter().position(|event| {
        if event.timestamp.date_naive() > range.end() && !(open && event.kind == EventKind::End) {
            return true;
        }
        open = event.kind == EventKind::Start;
        false
    });
    if let Some(cutoff) = cutoff {
        events.truncate(cutoff);
    }
    Ok(events)
}

/// Keeps the sessions whose start label contains `needle`, ignoring case.
///
/// An end belongs to the start before it; an unlabelled start never matches.
fn filter_sessions(events: Vec<RawEvent>, needle: &str) -> Vec<RawEvent> {
    let needle = needle.to_lowercase();
    let mut keep = false;
    events
        .into_iter()
        .filter(|event| {
            if event.kind == EventKind::Start {
                keep = event
                    .label
                    .as_deref()
                    .is_some_and(|label| label.to_lowercase().contains(&needle));
                keep
            } else {
                std::mem::take(&mut keep)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn parses_and_sorts_events() {
        let content = r#"{"timestamp":"2025-01-13T17:00:00+01:00","kind":"end"}

{"timestamp":"2025-01-13T09:00:00+01:00","kind":"start","label":"office"}
"#;
        let events = parse_events(content, &range((2025, 1, 13), (2025, 1, 13)), "test").unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Start);
        assert_eq!(events[0].label.as_deref(), Some("office"));
        assert_eq!(events[1].kind, EventKind::End);
    }

    #[test]
    fn ties_keep_file_order() {
        let content = r#"{"timestamp":"2025-01-13T09:00:00Z","kind":"start"}
{"timestamp":"2025-01-13T09:00:00Z","kind":"end"}
"#;
        let events = parse_events(content, &range((2025, 1, 13), (2025, 1, 13)), "test").unwrap();
        assert_eq!(events[0].kind, EventKind::Start);
        assert_eq!(events[1].kind, EventKind::End);
    }

    #[test]
    fn drops_events_after_range() {
        let content = r#"{"timestamp":"2025-01-13T09:00:00Z","kind":"start"}
{"timestamp":"2025-01-13T17:00:00Z","kind":"end"}
{"timestamp":"2025-01-20T09:00:00Z","kind":"start"}
{"timestamp":"2025-01-20T17:00:00Z","kind":"end"}
"#;
        let events = parse_events(content, &range((2025, 1, 13), (2025, 1, 19)), "test").unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn keeps_end_closing_session_open_at_range_end() {
        let content = r#"{"timestamp":"2025-01-13T23:00:00+01:00","kind":"start"}
{"timestamp":"2025-01-14T01:00:00+01:00","kind":"end"}
{"timestamp":"2025-01-14T09:00:00+01:00","kind":"start"}
{"timestamp":"2025-01-14T17:00:00+01:00","kind":"end"}
"#;
        let events = parse_events(content, &range((2025, 1, 13), (2025, 1, 13)), "test").unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::End);
        assert_eq!(events[1].timestamp.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
    }

    #[test]
    fn label_filter_keeps_matching_sessions() {
        let content = r#"{"timestamp":"2025-01-13T09:00:00Z","kind":"start","label":"Work"}
{"timestamp":"2025-01-13T12:00:00Z","kind":"end"}
{"timestamp":"2025-01-13T12:00:00Z","kind":"start","label":"lunch"}
{"timestamp":"2025-01-13T13:00:00Z","kind":"end","label":"lunch"}
{"timestamp":"2025-01-13T13:00:00Z","kind":"start"}
{"timestamp":"2025-01-13T14:00:00Z","kind":"end"}
{"timestamp":"2025-01-13T14:00:00Z","kind":"start","label":"more work"}
{"timestamp":"2025-01-13T17:00:00Z","kind":"end"}
"#;
        let events = parse_events(content, &range((2025, 1, 13), (2025, 1, 13)), "test").unwrap();
        let kept = filter_sessions(events, "WORK");

        let times: Vec<_> = kept.iter().map(|e| (e.kind, e.timestamp.format("%H:%M").to_string())).collect();
        assert_eq!(
            times,
            [
                (EventKind::Start, "09:00".to_string()),
                (EventKind::End, "12:00".to_string()),
                (EventKind::Start, "14:00".to_string()),
                (EventKind::End, "17:00".to_string()),
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_record() {
        let content = r#"{"timestamp":"2025-01-13T09:00:00Z","kind":"start"}
{"timestamp":"2025-01-13T17:00:00Z","kind":"pause"}
"#;
        let err = parse_events(content, &range((2025, 1, 13), (2025, 1, 13)), "events.jsonl")
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse { line: 2, .. }));
        assert!(err.to_string().starts_with("failed to parse events.jsonl at line 2"));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let source = JsonlFileSource::new(PathBuf::from("/nonexistent/wtrack/events.jsonl"), None);
        let err = source
            .fetch(&range((2025, 1, 13), (2025, 1, 13)))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }
}

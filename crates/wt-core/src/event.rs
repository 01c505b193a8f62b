//! Calendar events and the source that produces them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::range::DateRange;

/// Whether an event opens or closes a work session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    End,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::End => "end",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" | "in" => Ok(Self::Start),
            "end" | "out" => Ok(Self::End),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event kind strings.
#[derive(Debug, Clone)]
pub struct UnknownEventKind(String);

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for UnknownEventKind {}

/// A single timestamped calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: DateTime<FixedOffset>,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RawEvent {
    pub const fn start(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            kind: EventKind::Start,
            label: None,
        }
    }

    pub const fn end(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            kind: EventKind::End,
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Sorts events ascending by instant.
///
/// At equal instants an end sorts before a start, so back-to-back sessions
/// pair up instead of nesting.
pub fn sort_events(events: &mut [RawEvent]) {
    events.sort_by_key(|e| (e.timestamp, e.kind == EventKind::Start));
}

/// Errors raised by an [`EventSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The calendar could not be read.
    #[error("calendar source unavailable: {location}")]
    Unavailable {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The calendar was read but its content is malformed.
    #[error("failed to parse {location} at line {line}: {message}")]
    Parse {
        location: String,
        line: usize,
        message: String,
    },

    /// The calendar was read but its content is malformed, without a line position.
    #[error("invalid calendar {location}: {message}")]
    Invalid { location: String, message: String },
}

/// Supplies the events for an accounting window.
///
/// Implementations return events sorted ascending by timestamp (see
/// [`sort_events`]). Offsets must already be resolved by the source.
pub trait EventSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<RawEvent>, SourceError>;
}

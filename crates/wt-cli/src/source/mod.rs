//! Calendar file adapters implementing [`EventSource`].

mod ics;
mod jsonl;

use std::path::Path;

use wt_core::EventSource;

pub use ics::IcsFileSource;
pub use jsonl::JsonlFileSource;

use crate::Config;

/// Picks the adapter for the configured calendar by file extension.
///
/// `.jsonl` and `.json` files hold serialized events; anything else is read
/// as iCalendar.
pub fn from_config(config: &Config) -> Box<dyn EventSource> {
    let path = config.calendar_path.clone();
    if is_jsonl(&path) {
        tracing::debug!(path = %path.display(), "reading events from JSON Lines");
        Box::new(JsonlFileSource::new(path, config.label_filter.clone()))
    } else {
        tracing::debug!(path = %path.display(), "reading events from iCalendar");
        Box::new(IcsFileSource::new(path, config.label_filter.clone()))
    }
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_selects_adapter() {
        assert!(is_jsonl(Path::new("/data/events.jsonl")));
        assert!(is_jsonl(Path::new("/data/events.JSON")));
        assert!(!is_jsonl(Path::new("/data/work.ics")));
        assert!(!is_jsonl(Path::new("/data/work")));
    }
}

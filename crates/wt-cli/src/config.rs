//! Configuration loading and management.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate, Weekday};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wt_core::{DayOverride, OpenSessionPolicy, ScheduleModel};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Calendar file with work sessions (`.ics` or `.jsonl`).
    pub calendar_path: PathBuf,

    /// First day of accounting; reports start here unless `--from` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Only sessions whose summary (ICS) or start label (JSON Lines) contains
    /// this text count as work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_filter: Option<String>,

    /// Handling of a session that was started but not yet ended.
    #[serde(default)]
    pub open_session: OpenSessionPolicy,

    /// Expected hours per weekday, keyed by weekday name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<BTreeMap<String, f64>>,

    /// Days without expected work, with a description.
    #[serde(default)]
    pub holidays: BTreeMap<NaiveDate, String>,

    /// Days with a special expected workload in hours.
    #[serde(default)]
    pub exceptions: BTreeMap<NaiveDate, f64>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            calendar_path: data_dir.join("work.ics"),
            start_date: None,
            label_filter: None,
            open_session: OpenSessionPolicy::default(),
            schedule: None,
            holidays: BTreeMap::new(),
            exceptions: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WTRACK_*)
        figment = figment.merge(Env::prefixed("WTRACK_"));

        figment.extract()
    }

    /// Builds the schedule model from the weekday table and overrides.
    ///
    /// Without a `[schedule]` table the standard Monday to Friday 8h week is
    /// used. A table that names only some weekdays is an error.
    pub fn schedule_model(&self) -> Result<ScheduleModel> {
        let mut overrides: BTreeMap<NaiveDate, DayOverride> = self
            .exceptions
            .iter()
            .map(|(date, hours)| -> Result<(NaiveDate, DayOverride)> {
                Ok((*date, DayOverride::Exception(hours_to_duration(*hours)?)))
            })
            .collect::<Result<_>>()?;
        for date in self.holidays.keys() {
            overrides.insert(*date, DayOverride::Holiday);
        }

        let Some(table) = &self.schedule else {
            if overrides.is_empty() {
                return Ok(ScheduleModel::standard());
            }
            let standard = ScheduleModel::standard();
            let weekdays = wt_core::WEEKDAYS
                .iter()
                .map(|day| (*day, standard.weekday_duration(*day)));
            return Ok(ScheduleModel::new(weekdays, overrides)?);
        };

        let mut seen = HashSet::new();
        let weekdays = table
            .iter()
            .map(|(name, hours)| -> Result<(Weekday, Duration)> {
                let day: Weekday = name
                    .parse()
                    .map_err(|_| anyhow::anyhow!("unknown weekday in schedule: {name}"))?;
                if !seen.insert(day) {
                    bail!("weekday {day} appears twice in schedule (as {name})");
                }
                Ok((day, hours_to_duration(*hours)?))
            })
            .collect::<Result<Vec<_>>>()?;

        ScheduleModel::new(weekdays, overrides).context("invalid schedule configuration")
    }
}

/// Converts fractional hours to a duration in whole seconds.
#[allow(clippy::cast_possible_truncation)]
fn hours_to_duration(hours: f64) -> Result<Duration> {
    if !hours.is_finite() || hours.abs() > 24.0 * 366.0 {
        bail!("invalid number of hours: {hours}");
    }
    Ok(Duration::seconds((hours * 3600.0).round() as i64))
}

/// Returns the platform-specific config directory for wtrack.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wtrack"))
}

/// Returns the platform-specific data directory for wtrack.
///
/// On Linux: `~/.local/share/wtrack`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("wtrack"))
}

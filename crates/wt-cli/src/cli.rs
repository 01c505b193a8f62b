//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use wt_core::Granularity;

/// Work time tracker with overtime calculation.
///
/// Reads work sessions from a calendar and compares them against a fixed
/// number of expected hours per weekday.
#[derive(Debug, Parser)]
#[command(name = "wtrack", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show worked time, expectation and running overtime balance.
    Report {
        #[command(flatten)]
        range: RangeArgs,

        /// Row granularity.
        #[arg(long, value_enum, default_value_t = GroupBy::Day)]
        by: GroupBy,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the work intervals derived from the calendar.
    Intervals {
        #[command(flatten)]
        range: RangeArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the effective weekday schedule and date overrides.
    Schedule,
}

/// Accounting window shared by the reporting commands.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD, "today", "yesterday", "N days ago", "N weeks ago").
    #[arg(long)]
    pub from: Option<String>,

    /// Last day, inclusive. Defaults to today.
    #[arg(long)]
    pub to: Option<String>,
}

/// Report row granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupBy {
    Day,
    Week,
    Month,
}

impl GroupBy {
    /// The summary granularity, or `None` for per-day rows.
    pub const fn granularity(self) -> Option<Granularity> {
        match self {
            Self::Day => None,
            Self::Week => Some(Granularity::Week),
            Self::Month => Some(Granularity::Month),
        }
    }
}

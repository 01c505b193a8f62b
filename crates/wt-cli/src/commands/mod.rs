//! CLI subcommand implementations.

pub mod intervals;
pub mod report;
pub mod schedule;
pub mod util;

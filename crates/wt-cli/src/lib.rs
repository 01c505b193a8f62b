//! Work time tracker CLI library.
//!
//! This crate provides the command-line interface and the calendar adapters
//! for the overtime accounting in `wt-core`.

pub mod cli;
pub mod commands;
mod config;
pub mod pipeline;
pub mod source;

pub use cli::{Cli, Commands, GroupBy, RangeArgs};
pub use config::Config;

//! CLI support for the perf-report binary

pub mod commands;
pub mod error;
pub mod output;

pub use error::CliError;

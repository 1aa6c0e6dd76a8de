//! CLI module for the dashboard deployment tool.
//!
//! This module provides the command-line arguments and the colored status
//! output shown while the sequence runs.

mod commands;
mod output;

pub use commands::Cli;
pub use output::Console;

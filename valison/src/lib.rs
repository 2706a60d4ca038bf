// valison/src/lib.rs
//! # Valison CLI Application
//!
//! This crate provides the command-line interface for the `valison-core`
//! validation engine: argument parsing, logging setup, input/output handling,
//! and terminal rendering of issues and violations.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

use anyhow::Result;

use cli::{Cli, Commands};
use commands::Outcome;

/// Dispatches a parsed command line.
pub fn run(cli: &Cli) -> Result<Outcome> {
    match &cli.command {
        Commands::Validate(cmd) => commands::validate::run_validate(cmd, cli.quiet),
        Commands::Check(cmd) => commands::validate::run_check(cmd),
        Commands::Guards(cmd) => commands::guards::run_guards(cmd, cli.quiet),
        Commands::Functions(cmd) => commands::functions::run_functions(cmd),
    }
}

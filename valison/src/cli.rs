// valison/src/cli.rs
//! This file defines the command-line interface (CLI) for the valison application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "valison",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate and sanitize JSON documents with declarative rules",
    long_about = "Valison applies a rule file to a JSON document. Each rule names a property path and an ordered list of steps: sanitizers that clean the value, validators that check it, or guard expressions. Sanitized values are written back only when every step on their path passes.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress all informational and debug messages.
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging (overrides VALISON_LOG / RUST_LOG).
    #[arg(long, short = 'd', global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `valison` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes and validates a document, printing any issues.
    Validate(ValidateCommand),

    /// Like `validate`, but every rule must be a list of steps; prints `true`
    /// or the issues as JSON.
    Check(ValidateCommand),

    /// Evaluates guard rules against a document and reports each violation.
    Guards(GuardsCommand),

    /// Lists the registered validators and sanitizers.
    Functions(FunctionsCommand),
}

/// Input/output options shared by the document-processing commands.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Rule file (YAML, or JSON when the name ends in `.json`).
    #[arg(long, short = 'r', value_name = "FILE", env = "VALISON_RULES")]
    pub rules: PathBuf,

    /// Read the JSON document from this file instead of stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Write the resulting document to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Serialization used for the resulting document.
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: DataFormat,
}

/// Arguments for the `validate` and `check` commands.
#[derive(Args, Debug, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Print a single JSON report (`data` and `validity`) to stdout.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `guards` command.
#[derive(Args, Debug, Clone)]
pub struct GuardsCommand {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Skip the remaining guards of a path after its first violation.
    #[arg(long)]
    pub halt_on_violation: bool,

    /// Print a single JSON report (`context` and `violations`) to stdout.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `functions` command.
#[derive(Args, Debug, Clone)]
pub struct FunctionsCommand {
    /// Only list functions of this kind.
    #[arg(long, value_enum)]
    pub kind: Option<KindFilter>,

    /// Print the list as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Validator,
    Sanitizer,
}

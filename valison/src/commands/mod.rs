// valison/src/commands/mod.rs
//! Subcommand implementations and the I/O they share.
//!
//! License: MIT OR APACHE 2.0

pub mod functions;
pub mod guards;
pub mod validate;

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;

use crate::cli::{DataFormat, DocumentArgs};

/// How a command finished, which decides the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Clean,
    /// The document had issues or guard violations.
    Failed,
}

/// Reads the document text from `path`, or from stdin when `None`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            info!("Reading input from file: {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file {}", path.display()))
        }
        None => {
            debug!("Reading input from stdin.");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read input from stdin")?;
            Ok(buffer)
        }
    }
}

/// Serializes a document in the requested format, with a trailing newline.
pub fn render(value: &Value, format: DataFormat) -> Result<String> {
    let mut text = match format {
        DataFormat::Json => serde_json::to_string_pretty(value).context("Failed to serialize JSON output")?,
        DataFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize YAML output")?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Writes the resulting document to `--output`, or stdout.
pub fn write_document(value: &Value, args: &DocumentArgs) -> Result<()> {
    let text = render(value, args.format)?;
    match &args.output {
        Some(path) => {
            info!("Writing document to file: {}", path.display());
            fs::write(path, text).with_context(|| format!("Failed to write output file {}", path.display()))
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            writer.write_all(text.as_bytes()).context("Failed to write to stdout")
        }
    }
}

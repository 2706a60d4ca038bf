// valison/src/commands/validate.rs
//! The `validate` and `check` commands.
//!
//! Both sanitize the document and write it out. `validate` shows issues as a
//! table on stderr; `check` prints `true` or the issue map as JSON on stdout.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, Write};

use anyhow::{Context, Result};
use log::info;

use valison_core::{headless_validate_str, HeadlessMode, HeadlessReport, RulesFile};

use super::{read_input, write_document, Outcome};
use crate::cli::ValidateCommand;
use crate::ui::output;

/// Runs the rules over the input and returns the report.
pub fn run_report(cmd: &ValidateCommand, mode: HeadlessMode) -> Result<HeadlessReport> {
    let rules = RulesFile::load_from_file(&cmd.document.rules)?;
    let input = read_input(cmd.document.input.as_deref())?;
    let report = headless_validate_str(&rules, &input, mode)
        .with_context(|| format!("Failed to apply rules from {}", cmd.document.rules.display()))?;
    info!(
        "Validation finished with {} issue(s).",
        report.validity.issues().map_or(0, |issues| issues.len())
    );
    Ok(report)
}

fn outcome_of(report: &HeadlessReport) -> Outcome {
    if report.validity.is_valid() {
        Outcome::Clean
    } else {
        Outcome::Failed
    }
}

fn print_json_report(report: &HeadlessReport) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writeln!(writer)?;
    Ok(())
}

pub fn run_validate(cmd: &ValidateCommand, quiet: bool) -> Result<Outcome> {
    let report = run_report(cmd, HeadlessMode::Validate)?;

    if cmd.json {
        print_json_report(&report)?;
        return Ok(outcome_of(&report));
    }

    write_document(&report.data, &cmd.document)?;

    let color = output::stderr_supports_color();
    let mut stderr = io::stderr();
    if let (Some(path), false) = (&cmd.document.output, quiet) {
        output::print_info_message(&mut stderr, &format!("Wrote sanitized document to {}", path.display()), color)?;
    }
    match report.validity.issues() {
        Some(issues) => {
            writeln!(stderr, "{}", output::issue_table(issues, color))?;
        }
        None if !quiet => {
            output::print_success_message(&mut stderr, "All rules passed.", color)?;
        }
        None => {}
    }
    Ok(outcome_of(&report))
}

pub fn run_check(cmd: &ValidateCommand) -> Result<Outcome> {
    let report = run_report(cmd, HeadlessMode::Check)?;

    if cmd.json {
        print_json_report(&report)?;
        return Ok(outcome_of(&report));
    }

    if cmd.document.output.is_some() {
        write_document(&report.data, &cmd.document)?;
    }
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    serde_json::to_writer_pretty(&mut writer, &report.validity).context("Failed to serialize result")?;
    writeln!(writer)?;
    Ok(outcome_of(&report))
}

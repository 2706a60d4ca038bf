// valison/src/commands/guards.rs
//! The `guards` command: evaluates guard rules and reports violations.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, Write};

use anyhow::{Context, Result};
use log::info;

use valison_core::{headless_guards_str, RulesFile};

use super::{read_input, write_document, Outcome};
use crate::cli::GuardsCommand;
use crate::ui::output;

pub fn run_guards(cmd: &GuardsCommand, quiet: bool) -> Result<Outcome> {
    let rules = RulesFile::load_from_file(&cmd.document.rules)?;
    let input = read_input(cmd.document.input.as_deref())?;
    let report = headless_guards_str(&rules, &input, cmd.halt_on_violation)
        .with_context(|| format!("Failed to evaluate guards from {}", cmd.document.rules.display()))?;
    info!("Guard evaluation finished with {} violation(s).", report.violations.len());

    let outcome = if report.violations.is_empty() {
        Outcome::Clean
    } else {
        Outcome::Failed
    };

    if cmd.json {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        serde_json::to_writer_pretty(&mut writer, &report).context("Failed to serialize report")?;
        writeln!(writer)?;
        return Ok(outcome);
    }

    write_document(&report.context, &cmd.document)?;

    let color = output::stderr_supports_color();
    let mut stderr = io::stderr();
    if let (Some(path), false) = (&cmd.document.output, quiet) {
        output::print_info_message(&mut stderr, &format!("Wrote context to {}", path.display()), color)?;
    }
    if !report.violations.is_empty() {
        writeln!(stderr, "{}", output::violation_table(&report.violations, color))?;
    } else if !quiet {
        output::print_success_message(&mut stderr, "No guard violations.", color)?;
    }
    Ok(outcome)
}

//! Convenience wrappers for one-shot, non-interactive use.
//!
//! These take a loaded [`RulesFile`] and the data as JSON text, and return
//! the (possibly sanitized) data together with the result.
//!
//! License: MIT OR APACHE 2.0

use std::ops::ControlFlow;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::RulesFile;
use crate::engine::Engine;
use crate::registry::default_registry;
use crate::report::Validity;

/// Which operation a headless run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessMode {
    /// Lenient definition shape; reports the issue map.
    Validate,
    /// Strict definition shape; reports `true` or the issue map.
    Check,
}

/// Output of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessReport {
    /// The data after sanitization.
    pub data: Value,
    pub validity: Validity,
}

/// A single guard violation, as reported by [`headless_guards_str`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardViolation {
    pub path: String,
    pub message: String,
}

/// Output of a headless guard run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardReport {
    pub context: Value,
    pub violations: Vec<GuardViolation>,
}

fn parse_input(input: &str) -> Result<Value> {
    serde_json::from_str(input).context("Input is not valid JSON")
}

/// Runs `rules` over the JSON document `input` with the built-in functions.
pub fn headless_validate_str(rules: &RulesFile, input: &str, mode: HeadlessMode) -> Result<HeadlessReport> {
    let mut data = parse_input(input)?;
    let engine = Engine::with_registry(default_registry()).with_options(rules.options.clone());
    let validity = match mode {
        HeadlessMode::Validate => Validity::from(engine.validate(&rules.rules, &mut data)?),
        HeadlessMode::Check => engine.is_valid(&rules.rules, &mut data)?,
    };
    Ok(HeadlessReport { data, validity })
}

/// Evaluates the guards in `rules` over the JSON document `input`.
///
/// When `halt_on_violation` is set, the first violation on a path skips the
/// rest of that path.
pub fn headless_guards_str(rules: &RulesFile, input: &str, halt_on_violation: bool) -> Result<GuardReport> {
    let mut context = parse_input(input)?;
    let engine = Engine::with_registry(default_registry()).with_options(rules.options.clone());
    let mut violations = Vec::new();
    engine.evaluate_guards(&rules.rules, &mut context, |step, path| {
        violations.push(GuardViolation {
            path: path.to_string(),
            message: step.issue_message(),
        });
        if halt_on_violation {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    Ok(GuardReport { context, violations })
}

//! The orchestrator: runs a whole rule definition against a data object.
//!
//! Paths are processed in definition order and independently of each other,
//! except that sanitized values and committed `set` results are written into
//! the shared data, so later paths observe them.
//!
//! The definition is fully parsed before any path runs. A malformed
//! definition or an unknown function name therefore fails the whole call
//! without touching the data.
//!
//! License: MIT OR APACHE 2.0

use std::ops::ControlFlow;

use log::debug;
use serde_json::Value;

use crate::config::EngineOptions;
use crate::definition::{GuardStep, RuleDefinition, Shape, Steps};
use crate::errors::{Result, ValisonError};
use crate::guards::run_guards;
use crate::pipeline::{run_pipeline, PipelineOutcome};
use crate::registry::{default_registry, FunctionRegistry};
use crate::report::{IssueMap, Validity};

/// Runs rule definitions against data using one registry and set of options.
#[derive(Debug, Clone)]
pub struct Engine<'r> {
    registry: &'r FunctionRegistry,
    options: EngineOptions,
}

impl Default for Engine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine<'static> {
    /// An engine over the built-in functions with default options.
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }
}

impl<'r> Engine<'r> {
    pub fn with_registry(registry: &'r FunctionRegistry) -> Self {
        Self {
            registry,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parses `definition` against this engine's registry and options.
    pub fn parse(&self, definition: &Value, shape: Shape) -> Result<RuleDefinition> {
        RuleDefinition::parse(definition, self.registry, &self.options, shape)
    }

    /// Sanitizes and validates `data` in place, returning the issues found.
    ///
    /// An empty map means every path passed.
    pub fn validate(&self, definition: &Value, data: &mut Value) -> Result<IssueMap> {
        let parsed = self.parse(definition, Shape::Lenient)?;
        self.validate_parsed(&parsed, data)
    }

    /// Like [`Engine::validate`], with the definition already parsed.
    pub fn validate_parsed(&self, definition: &RuleDefinition, data: &mut Value) -> Result<IssueMap> {
        let mut issues = IssueMap::new();

        for rules in definition.entries() {
            let path = rules.path.as_str();
            match &rules.steps {
                Steps::Calls(steps) => {
                    if let PipelineOutcome::Failed { message, .. } = run_pipeline(&rules.path, steps, data) {
                        debug!("Path '{}' failed: {}", path, message);
                        issues.insert(path.to_string(), message);
                    }
                }
                Steps::Guards(steps) => {
                    let mut steps = steps.clone();
                    let mut failure = None;
                    run_guards(&rules.path, &mut steps, data, self.registry, &mut |step, _| {
                        failure = Some(step.issue_message());
                        ControlFlow::Break(())
                    })?;
                    if let Some(message) = failure {
                        debug!("Path '{}' failed: {}", path, message);
                        issues.insert(path.to_string(), message);
                    }
                }
            }
        }

        debug!(
            "Validated {} path(s), {} issue(s).",
            definition.len(),
            issues.len()
        );
        Ok(issues)
    }

    /// Strict variant of [`Engine::validate`]: every path must map to a list
    /// of steps. Returns [`Validity::Valid`] when no issues were found.
    pub fn is_valid(&self, definition: &Value, data: &mut Value) -> Result<Validity> {
        let parsed = self.parse(definition, Shape::Strict)?;
        Ok(Validity::from(self.validate_parsed(&parsed, data)?))
    }

    /// Runs the guard-steps of `definition` against `context`.
    ///
    /// `on_violation` is called with each violated step and its path; returning
    /// [`ControlFlow::Break`] skips the rest of that path. Returns the parsed
    /// definition with every step's `pass` filled in for the steps reached.
    pub fn evaluate_guards<F>(
        &self,
        definition: &Value,
        context: &mut Value,
        mut on_violation: F,
    ) -> Result<RuleDefinition>
    where
        F: FnMut(&GuardStep, &str) -> ControlFlow<()>,
    {
        let mut parsed = self.parse(definition, Shape::Lenient)?;

        for rules in parsed.entries_mut() {
            let steps = match &mut rules.steps {
                Steps::Guards(steps) => steps,
                Steps::Calls(calls) if calls.is_empty() => continue,
                Steps::Calls(_) => {
                    return Err(ValisonError::malformed(
                        rules.path.as_str(),
                        "only guard-steps can be evaluated as guards",
                    ));
                }
            };
            let outcome = run_guards(&rules.path, steps, context, self.registry, &mut on_violation)?;
            debug!(
                "Guards for '{}': {} violation(s), halted: {}, committed: {}.",
                rules.path, outcome.violations, outcome.halted, outcome.committed
            );
        }

        Ok(parsed)
    }
}

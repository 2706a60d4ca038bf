//! Guard evaluation: runs a path's expression steps in order.
//!
//! Each expression sees `value` (the path's pending value) and the top-level
//! keys of the context, with the pending value applied at the path. `set`
//! steps update the pending value; it is written to the context when the path
//! finishes without a violation.
//!
//! License: MIT OR APACHE 2.0

use std::ops::ControlFlow;

use log::debug;
use serde_json::Value;

use crate::definition::{GuardKind, GuardStep};
use crate::errors::Result;
use crate::expr::{truthy, Bindings};
use crate::path::PropertyPath;
use crate::registry::{FunctionRegistry, RegistryEntry};

/// Called for each violated `if`/`unless` step with the step and its path.
/// Returning [`ControlFlow::Break`] stops the remaining steps of that path.
pub type ViolationHandler<'h> = dyn FnMut(&GuardStep, &str) -> ControlFlow<()> + 'h;

/// Result of running one path's guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardOutcome {
    pub violations: usize,
    pub halted: bool,
    pub committed: bool,
}

struct Scope<'a> {
    registry: &'a FunctionRegistry,
    value: &'a Value,
    context: &'a Value,
}

impl<'a> Bindings for Scope<'a> {
    fn variable(&self, name: &str) -> Option<&Value> {
        if name == "value" {
            return Some(self.value);
        }
        self.context.get(name)
    }

    fn function(&self, name: &str) -> Option<RegistryEntry> {
        self.registry.resolve(name).ok()
    }
}

/// Runs `steps` for `path` against `context`, annotating each step's `pass`.
pub fn run_guards(
    path: &PropertyPath,
    steps: &mut [GuardStep],
    context: &mut Value,
    registry: &FunctionRegistry,
    on_violation: &mut ViolationHandler<'_>,
) -> Result<GuardOutcome> {
    for step in steps.iter_mut() {
        step.pass = None;
    }

    let null = Value::Null;
    let mut outcome = GuardOutcome::default();
    let mut pending: Option<Value> = path.get(context).cloned();
    // A copy of the context with the pending value applied; only made once a
    // `set` step has run.
    let mut overlay: Option<Value> = None;

    for index in 0..steps.len() {
        let step = &mut steps[index];
        let result = {
            let scope = Scope {
                registry,
                value: pending.as_ref().unwrap_or(&null),
                context: overlay.as_ref().unwrap_or(&*context),
            };
            step.expression.evaluate(&scope)?
        };

        let violated = match step.kind {
            GuardKind::Set => {
                debug!("{}: set {} -> {}", path, step.source(), result);
                let view = overlay.get_or_insert_with(|| context.clone());
                path.set(view, result.clone());
                pending = Some(result);
                step.pass = Some(true);
                continue;
            }
            GuardKind::If => truthy(&result),
            GuardKind::Unless => !truthy(&result),
        };
        step.pass = Some(!violated);

        if violated {
            debug!("{}: guard '{} {}' violated", path, step.kind, step.source());
            outcome.violations += 1;
            if on_violation(&steps[index], path.as_str()).is_break() {
                outcome.halted = true;
                break;
            }
        }
    }

    if outcome.violations == 0 && overlay.is_some() {
        if let Some(value) = pending {
            path.set(context, value);
            outcome.committed = true;
        }
    }
    Ok(outcome)
}

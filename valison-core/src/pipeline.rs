//! The rule pipeline: runs a path's call-steps in order.
//!
//! Sanitizers transform a working copy of the path's value; validators judge
//! the current working value. The first failing validator stops the path and
//! nothing is written back. When every step passes, the working value is
//! committed to the data, unless no sanitizer ever ran, in which case the
//! data is left as it was.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use serde_json::Value;

use crate::definition::CallStep;
use crate::path::PropertyPath;
use crate::registry::FunctionKind;

/// Result of running one path's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every step passed. `committed` tells whether a sanitized value was
    /// written back.
    Passed { committed: bool },
    /// The step at `step` failed with `message`.
    Failed { step: usize, message: String },
}

impl PipelineOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, PipelineOutcome::Passed { .. })
    }
}

/// Runs `steps` against the value at `path` in `data`.
pub fn run_pipeline(path: &PropertyPath, steps: &[CallStep], data: &mut Value) -> PipelineOutcome {
    let null = Value::Null;
    let original = path.get(data);
    // Only materialized once a sanitizer has produced something.
    let mut working: Option<Value> = None;

    for (index, step) in steps.iter().enumerate() {
        let current = working.as_ref().or(original).unwrap_or(&null);
        let result = step.function.invoke(current, &step.args);
        match step.kind() {
            FunctionKind::Sanitizer => {
                debug!("{}: '{}' -> {}", path, step.function.name, result);
                working = Some(result);
            }
            FunctionKind::Validator => {
                // A validator fails when it returns exactly `!inverted`.
                if result == Value::Bool(step.inverted) {
                    debug!("{}: '{}' failed on {}", path, step.name, current);
                    return PipelineOutcome::Failed {
                        step: index,
                        message: step.issue_message().to_string(),
                    };
                }
            }
        }
    }

    let committed = match working {
        Some(value) => {
            path.set(data, value);
            true
        }
        None => false,
    };
    PipelineOutcome::Passed { committed }
}

//! errors.rs - Custom error types for the valison-core library.
//!
//! Every variant here is a structural or configuration problem: a malformed
//! path, a rule naming an unknown function, a definition of the wrong shape, or
//! a guard expression that cannot be parsed or evaluated. A value that simply
//! fails a rule is never an error; it is reported through the issue map.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

use crate::registry::FunctionKind;

/// All possible error types in the `valison-core` library.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ValisonError {
    #[error("Invalid path '{path}': {reason}")]
    PathSyntax { path: String, reason: String },

    #[error("Function '{0}' is not registered")]
    UnregisteredFunction(String),

    #[error("Function '{name}' is already registered as a {kind}")]
    DuplicateFunction { name: String, kind: FunctionKind },

    #[error("Malformed rule definition at '{path}': {reason}")]
    MalformedDefinition { path: String, reason: String },

    #[error("Syntax error in expression '{source_text}' at offset {position}: {reason}")]
    ExpressionSyntax {
        source_text: String,
        position: usize,
        reason: String,
    },

    #[error("Failed to evaluate expression '{source_text}': {reason}")]
    Evaluation { source_text: String, reason: String },
}

impl ValisonError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ValisonError::MalformedDefinition {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ValisonError> = std::result::Result<T, E>;

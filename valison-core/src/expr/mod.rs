//! Guard expressions.
//!
//! Guards are written in a small, side-effect-free expression language: JSON
//! literals, identifiers, member and index access, arithmetic, comparison,
//! logical operators, and calls to registered functions. Nothing else is
//! reachable from an expression; there is no host-language `eval`.
//!
//! A call passes its first argument as the subject value and the rest as the
//! function's arguments, so `isLength(value, 2, 10)` behaves like the rule step
//! `["isLength", null, 2, 10]`.
//!
//! License: MIT OR APACHE 2.0

mod eval;
mod lexer;
mod parser;

use serde_json::Value;

use crate::errors::{Result, ValisonError};

pub use eval::{truthy, Bindings};
pub use parser::{BinaryOp, Expr, UnaryOp};

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tree: Expr,
}

impl Expression {
    /// Parses `source`, failing with [`ValisonError::ExpressionSyntax`].
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            source: source.to_string(),
            tree: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Names of every function the expression calls.
    pub fn function_names(&self) -> Vec<&str> {
        self.tree.called_functions()
    }

    /// Evaluates against `bindings`, failing with [`ValisonError::Evaluation`].
    pub fn evaluate(&self, bindings: &dyn Bindings) -> Result<Value> {
        eval::evaluate(&self.tree, bindings).map_err(|reason| ValisonError::Evaluation {
            source_text: self.source.clone(),
            reason,
        })
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

//! # Valison Core Library
//!
//! `valison-core` validates and sanitizes nested JSON data with declarative,
//! path-addressed rules. A rule definition maps property paths to ordered
//! steps; each step either calls a registered function (a sanitizer that
//! transforms the value, or a validator that judges it) or evaluates a guard
//! expression.
//!
//! ## Modules
//!
//! * `path`: Parses `a.b[0]["c d"]` style paths and reads/writes nested values.
//! * `registry`: Named validators and sanitizers, and the default registry.
//! * `builtins`: The built-in function library.
//! * `definition`: Parses raw rule data into typed steps.
//! * `expr`: The guard expression language.
//! * `pipeline`: Runs call-steps for one path.
//! * `guards`: Runs guard-steps for one path.
//! * `engine`: Runs a whole definition against a data object.
//! * `config`: Engine options and rule files.
//! * `report`: Issue maps and validity results.
//! * `headless`: One-shot wrappers over JSON text.
//!
//! ## Usage Example
//!
//! ```rust
//! use serde_json::json;
//!
//! fn main() -> Result<(), valison_core::ValisonError> {
//!     let rules = json!({
//!         "name": ["trim", ["isLength", "Name must be 2-20 characters", 2, 20]],
//!         "email": ["trim", "toLowerCase", ["isEmail", "Not an email"]],
//!     });
//!     let mut data = json!({"name": "  Ann ", "email": " ANN@Example.com"});
//!
//!     let issues = valison_core::validate(&rules, &mut data)?;
//!     assert!(issues.is_empty());
//!     assert_eq!(data, json!({"name": "Ann", "email": "ann@example.com"}));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! A value failing a rule is not an error: it is reported in the returned
//! [`IssueMap`]. [`ValisonError`] is reserved for structural problems such as
//! malformed paths, unknown function names and bad guard expressions, which
//! are detected before any data is touched.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod builtins;
pub mod config;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod expr;
pub mod guards;
pub mod headless;
pub mod path;
pub mod pipeline;
pub mod registry;
pub mod report;

use std::ops::ControlFlow;

use serde_json::Value;

pub use config::{EngineOptions, RulesFile};
pub use definition::{CallStep, GuardKind, GuardStep, PathRules, RuleDefinition, Shape, Steps};
pub use engine::Engine;
pub use errors::ValisonError;
pub use expr::Expression;
pub use headless::{headless_guards_str, headless_validate_str, GuardReport, GuardViolation, HeadlessMode, HeadlessReport};
pub use path::PropertyPath;
pub use registry::{default_registry, Function, FunctionKind, FunctionRegistry, FunctionSource, RegistryEntry};
pub use report::{IssueMap, Validity};

/// Validates and sanitizes `data` in place with the built-in functions.
///
/// See [`Engine::validate`].
pub fn validate(definition: &Value, data: &mut Value) -> errors::Result<IssueMap> {
    Engine::new().validate(definition, data)
}

/// Strict validation returning [`Validity::Valid`] or the issues.
///
/// See [`Engine::is_valid`].
pub fn is_valid(definition: &Value, data: &mut Value) -> errors::Result<Validity> {
    Engine::new().is_valid(definition, data)
}

/// Evaluates guard-steps against `context`.
///
/// See [`Engine::evaluate_guards`].
pub fn evaluate_guards<F>(definition: &Value, context: &mut Value, on_violation: F) -> errors::Result<RuleDefinition>
where
    F: FnMut(&GuardStep, &str) -> ControlFlow<()>,
{
    Engine::new().evaluate_guards(definition, context, on_violation)
}

//! Rule definitions: parsing raw rule data into typed steps.
//!
//! A definition maps property paths to step lists. Each step is either a
//! call-step naming a registered function:
//!
//! ```json
//! ["isLength", "Name must be 2-20 characters", 2, 20]
//! ```
//!
//! or a guard-step holding an expression:
//!
//! ```json
//! { "unless": "isEmail(value)", "msg": "Not an email" }
//! ```
//!
//! Parsing resolves every function name against the registry (including names
//! called inside guard expressions) and decides each step's message up front,
//! so evaluation never meets an unknown name or an ambiguous argument list.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::config::EngineOptions;
use crate::errors::{Result, ValisonError};
use crate::expr::Expression;
use crate::path::PropertyPath;
use crate::registry::{FunctionKind, FunctionRegistry, RegistryEntry};

/// How strictly the per-path step values are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Accepts a bare name, a bare tuple, a guard object, or a list of steps.
    Lenient,
    /// Accepts only a list of steps.
    Strict,
}

/// A named function invocation with literal arguments.
#[derive(Debug, Clone)]
pub struct CallStep {
    /// The name as written, including a leading `!`.
    pub name: String,
    pub function: RegistryEntry,
    pub args: Vec<Value>,
    pub message: Option<String>,
    /// Set by a leading `!`: the validator fails when it returns `true`.
    pub inverted: bool,
}

impl CallStep {
    pub fn kind(&self) -> FunctionKind {
        self.function.kind
    }

    /// The message recorded when this step fails.
    pub fn issue_message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    If,
    Unless,
    Set,
}

impl GuardKind {
    pub fn keyword(self) -> &'static str {
        match self {
            GuardKind::If => "if",
            GuardKind::Unless => "unless",
            GuardKind::Set => "set",
        }
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An expression-driven step.
///
/// `if` is violated when its expression is truthy, `unless` when it is falsy.
/// `set` replaces the path's value with the expression result.
#[derive(Debug, Clone)]
pub struct GuardStep {
    pub kind: GuardKind,
    pub expression: Expression,
    pub msg: Option<String>,
    /// `None` until evaluated; `Some(true)` for passed guards and executed
    /// `set` steps.
    pub pass: Option<bool>,
}

impl GuardStep {
    pub fn source(&self) -> &str {
        self.expression.source()
    }

    pub fn issue_message(&self) -> String {
        match &self.msg {
            Some(msg) => msg.clone(),
            None => format!("{} {}", self.kind, self.source()),
        }
    }
}

/// The steps of one path. A path holds one kind of step only.
#[derive(Debug, Clone)]
pub enum Steps {
    Calls(Vec<CallStep>),
    Guards(Vec<GuardStep>),
}

impl Steps {
    pub fn len(&self) -> usize {
        match self {
            Steps::Calls(steps) => steps.len(),
            Steps::Guards(steps) => steps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One path and its steps.
#[derive(Debug, Clone)]
pub struct PathRules {
    pub path: PropertyPath,
    pub steps: Steps,
}

/// A parsed rule definition, in definition order.
#[derive(Debug, Clone, Default)]
pub struct RuleDefinition {
    entries: Vec<PathRules>,
}

impl RuleDefinition {
    /// Parses `raw`, which must be an object mapping paths to steps.
    pub fn parse(
        raw: &Value,
        registry: &FunctionRegistry,
        options: &EngineOptions,
        shape: Shape,
    ) -> Result<Self> {
        let Value::Object(map) = raw else {
            return Err(ValisonError::malformed("", "definition must be an object"));
        };

        let compiler = Compiler { registry, options };
        let mut entries = Vec::with_capacity(map.len());
        for (raw_path, value) in map {
            if raw_path.is_empty() {
                return Err(ValisonError::malformed(raw_path, "path must not be empty"));
            }
            let path = PropertyPath::parse(raw_path)?;
            let steps = compiler.steps(raw_path, value, shape)?;
            if steps.is_empty() {
                warn!("Path '{}' has no steps.", raw_path);
            }
            debug!("Parsed {} step(s) for path '{}'.", steps.len(), raw_path);
            entries.push(PathRules { path, steps });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PathRules] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [PathRules] {
        &mut self.entries
    }

    pub fn get(&self, path: &str) -> Option<&PathRules> {
        self.entries.iter().find(|rules| rules.path.as_str() == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every guard step with the path it belongs to.
    pub fn guard_steps(&self) -> impl Iterator<Item = (&PropertyPath, &GuardStep)> {
        self.entries.iter().flat_map(|rules| {
            let guards = match &rules.steps {
                Steps::Guards(guards) => guards.as_slice(),
                Steps::Calls(_) => &[],
            };
            guards.iter().map(move |step| (&rules.path, step))
        })
    }
}

enum Step {
    Call(CallStep),
    Guard(GuardStep),
}

struct Compiler<'a> {
    registry: &'a FunctionRegistry,
    options: &'a EngineOptions,
}

impl<'a> Compiler<'a> {
    fn steps(&self, path: &str, value: &Value, shape: Shape) -> Result<Steps> {
        let parsed = match (value, shape) {
            (Value::Array(items), _) if is_bare_tuple(items) => vec![Step::Call(self.call(path, items)?)],
            (Value::Array(items), _) => items
                .iter()
                .map(|item| self.step(path, item))
                .collect::<Result<Vec<_>>>()?,
            (_, Shape::Strict) => {
                return Err(ValisonError::malformed(path, "steps must be a list"));
            }
            (Value::String(_), Shape::Lenient) => vec![self.step(path, value)?],
            (Value::Object(_), Shape::Lenient) => vec![self.step(path, value)?],
            (_, Shape::Lenient) => {
                return Err(ValisonError::malformed(
                    path,
                    "steps must be a name, a list, or a guard object",
                ));
            }
        };

        let mut calls = Vec::new();
        let mut guards = Vec::new();
        for step in parsed {
            match step {
                Step::Call(call) => calls.push(call),
                Step::Guard(guard) => guards.push(guard),
            }
        }
        match (calls.is_empty(), guards.is_empty()) {
            (_, true) => Ok(Steps::Calls(calls)),
            (true, false) => Ok(Steps::Guards(guards)),
            (false, false) => Err(ValisonError::malformed(
                path,
                "call-steps and guard-steps cannot be mixed in one path",
            )),
        }
    }

    fn step(&self, path: &str, item: &Value) -> Result<Step> {
        match item {
            Value::String(_) => Ok(Step::Call(self.call(path, std::slice::from_ref(item))?)),
            Value::Array(items) => Ok(Step::Call(self.call(path, items)?)),
            Value::Object(map) => Ok(Step::Guard(self.guard(path, map)?)),
            other => Err(ValisonError::malformed(
                path,
                format!("unexpected step {}", other),
            )),
        }
    }

    fn call(&self, path: &str, items: &[Value]) -> Result<CallStep> {
        let Some(Value::String(written)) = items.first() else {
            return Err(ValisonError::malformed(path, "a call-step must start with a function name"));
        };
        let stripped: String = written.chars().filter(|c| !c.is_whitespace()).collect();
        let (inverted, lookup) = match stripped.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, stripped.as_str()),
        };
        if lookup.is_empty() {
            return Err(ValisonError::malformed(path, "empty function name"));
        }

        let function = self.registry.resolve(lookup)?;
        if inverted && function.kind == FunctionKind::Sanitizer {
            warn!("Path '{}': '!' has no effect on sanitizer '{}'.", path, lookup);
        }

        let mut args = items[1..].to_vec();
        let message = self.take_message(&mut args, function.kind);

        Ok(CallStep {
            name: written.clone(),
            function,
            args,
            message,
            inverted,
        })
    }

    fn take_message(&self, args: &mut Vec<Value>, kind: FunctionKind) -> Option<String> {
        let marker = self.options.message_marker.as_str();
        if !marker.is_empty() {
            let marked = args
                .iter()
                .position(|arg| arg.as_str().is_some_and(|s| s.starts_with(marker)));
            if let Some(index) = marked {
                if let Value::String(s) = args.remove(index) {
                    return Some(s[marker.len()..].trim_start().to_string());
                }
            }
        }

        if self.options.positional_messages && kind == FunctionKind::Validator {
            match args.first() {
                Some(Value::String(_)) => {
                    if let Value::String(s) = args.remove(0) {
                        return Some(s);
                    }
                }
                Some(Value::Null) => {
                    args.remove(0);
                }
                _ => {}
            }
        }
        None
    }

    fn guard(&self, path: &str, map: &Map<String, Value>) -> Result<GuardStep> {
        let mut found: Option<(GuardKind, &Value)> = None;
        let mut msg = None;
        for (key, value) in map {
            let kind = match key.as_str() {
                "if" => GuardKind::If,
                "unless" => GuardKind::Unless,
                "set" => GuardKind::Set,
                "msg" => {
                    msg = match value {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        _ => return Err(ValisonError::malformed(path, "guard 'msg' must be a string")),
                    };
                    continue;
                }
                other => {
                    return Err(ValisonError::malformed(
                        path,
                        format!("unknown guard key '{}'", other),
                    ))
                }
            };
            if found.is_some() {
                return Err(ValisonError::malformed(
                    path,
                    "a guard needs exactly one of 'if', 'unless', 'set'",
                ));
            }
            found = Some((kind, value));
        }

        let Some((kind, source)) = found else {
            return Err(ValisonError::malformed(
                path,
                "a guard needs exactly one of 'if', 'unless', 'set'",
            ));
        };
        let Value::String(source) = source else {
            return Err(ValisonError::malformed(
                path,
                format!("guard '{}' expression must be a string", kind),
            ));
        };

        let expression = Expression::parse(source)?;
        for name in expression.function_names() {
            self.registry.resolve(name)?;
        }

        Ok(GuardStep {
            kind,
            expression,
            msg,
            pass: None,
        })
    }
}

/// A list is a single call-step (rather than a list of steps) when it starts
/// with a name and holds at least one scalar argument.
fn is_bare_tuple(items: &[Value]) -> bool {
    matches!(items.first(), Some(Value::String(_)))
        && items[1..]
            .iter()
            .any(|v| !(v.is_string() || v.is_array() || v.is_object()))
}

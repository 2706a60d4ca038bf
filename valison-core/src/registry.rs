//! The function registry: named validators and sanitizers.
//!
//! Rule steps refer to operations by name. The registry maps each name to a
//! callable and a [`FunctionKind`], which decides how the pipeline treats the
//! call's result: a sanitizer's output replaces the current value, a
//! validator's output is a pass/fail verdict.
//!
//! A registry is assembled from one or more [`FunctionSource`]s and is
//! read-only afterwards. Registering the same name twice within one kind is
//! rejected ([`ValisonError::DuplicateFunction`]); the same name may exist once
//! per kind, and lookups prefer the sanitizer.
//!
//! Validators must return a JSON boolean. The pipeline compares the result
//! against `true`/`false` by identity, so any other value never fails a plain
//! step and never fails an inverted one either.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use crate::builtins;
use crate::errors::ValisonError;

/// A registered operation: receives the current value and the step arguments.
pub type Function = Arc<dyn Fn(&Value, &[Value]) -> Value + Send + Sync>;

/// Whether a function transforms the value or judges it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Validator,
    Sanitizer,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FunctionKind::Validator => f.write_str("validator"),
            FunctionKind::Sanitizer => f.write_str("sanitizer"),
        }
    }
}

/// A resolved registry entry.
#[derive(Clone)]
pub struct RegistryEntry {
    pub name: String,
    pub kind: FunctionKind,
    function: Function,
}

impl RegistryEntry {
    pub fn invoke(&self, value: &Value, args: &[Value]) -> Value {
        (self.function)(value, args)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Anything that can contribute named functions to a registry.
pub trait FunctionSource {
    /// A short label used in log output.
    fn label(&self) -> &str;

    /// Registers every function of this source into `registry`.
    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<(), ValisonError>;
}

/// Immutable-after-build mapping from operation name to callable.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    sanitizers: BTreeMap<String, Function>,
    validators: BTreeMap<String, Function>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("sanitizers", &self.sanitizers.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in validator and sanitizer.
    pub fn builtin() -> Self {
        match Self::from_sources(&builtins::sources()) {
            Ok(registry) => registry,
            // Built-in names are distinct per kind; a clash is a programming error.
            Err(e) => panic!("built-in function library is inconsistent: {}", e),
        }
    }

    /// Builds a registry by merging `sources` in order.
    pub fn from_sources(sources: &[&dyn FunctionSource]) -> Result<Self, ValisonError> {
        let mut registry = Self::new();
        for source in sources {
            registry.extend_from(*source)?;
        }
        Ok(registry)
    }

    /// Merges one more source into this registry.
    pub fn extend_from(&mut self, source: &dyn FunctionSource) -> Result<(), ValisonError> {
        let before = self.len();
        source.register_into(self)?;
        debug!(
            "Registered {} function(s) from source '{}'.",
            self.len() - before,
            source.label()
        );
        Ok(())
    }

    /// Registers `function` under `name` in the `kind` namespace.
    pub fn register<F>(&mut self, name: &str, kind: FunctionKind, function: F) -> Result<(), ValisonError>
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.register_arc(name, kind, Arc::new(function))
    }

    pub fn register_arc(&mut self, name: &str, kind: FunctionKind, function: Function) -> Result<(), ValisonError> {
        let namespace = match kind {
            FunctionKind::Sanitizer => &mut self.sanitizers,
            FunctionKind::Validator => &mut self.validators,
        };
        if namespace.contains_key(name) {
            return Err(ValisonError::DuplicateFunction {
                name: name.to_string(),
                kind,
            });
        }
        namespace.insert(name.to_string(), function);
        Ok(())
    }

    /// Looks `name` up, sanitizers first.
    pub fn resolve(&self, name: &str) -> Result<RegistryEntry, ValisonError> {
        let found = self
            .sanitizers
            .get(name)
            .map(|f| (FunctionKind::Sanitizer, f))
            .or_else(|| self.validators.get(name).map(|f| (FunctionKind::Validator, f)));

        match found {
            Some((kind, function)) => Ok(RegistryEntry {
                name: name.to_string(),
                kind,
                function: Arc::clone(function),
            }),
            None => Err(ValisonError::UnregisteredFunction(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sanitizers.contains_key(name) || self.validators.contains_key(name)
    }

    /// Every registered `(name, kind)` pair, sorted by kind then name.
    pub fn names(&self) -> Vec<(&str, FunctionKind)> {
        let sanitizers = self.sanitizers.keys().map(|n| (n.as_str(), FunctionKind::Sanitizer));
        let validators = self.validators.keys().map(|n| (n.as_str(), FunctionKind::Validator));
        let mut all: Vec<_> = validators.chain(sanitizers).collect();
        all.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        all
    }

    pub fn len(&self) -> usize {
        self.sanitizers.len() + self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static DEFAULT_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(|| {
    let registry = FunctionRegistry::builtin();
    debug!("Built default function registry with {} entries.", registry.len());
    registry
});

/// The process-wide registry of built-in functions, built on first use.
pub fn default_registry() -> &'static FunctionRegistry {
    &DEFAULT_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Pair(&'static str);

    impl FunctionSource for Pair {
        fn label(&self) -> &str {
            self.0
        }

        fn register_into(&self, registry: &mut FunctionRegistry) -> Result<(), ValisonError> {
            registry.register("shout", FunctionKind::Sanitizer, |v, _| {
                json!(v.as_str().unwrap_or_default().to_uppercase())
            })
        }
    }

    #[test]
    fn resolve_prefers_sanitizers() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("dual", FunctionKind::Validator, |_, _| json!(true))
            .unwrap();
        registry
            .register("dual", FunctionKind::Sanitizer, |_, _| json!("clean"))
            .unwrap();

        let entry = registry.resolve("dual").unwrap();
        assert_eq!(entry.kind, FunctionKind::Sanitizer);
        assert_eq!(entry.invoke(&json!("x"), &[]), json!("clean"));
    }

    #[test]
    fn unknown_names_are_unregistered() {
        let registry = FunctionRegistry::new();
        let err = registry.resolve("bogus").unwrap_err();
        assert!(matches!(err, ValisonError::UnregisteredFunction(name) if name == "bogus"));
    }

    #[test]
    fn merging_sources_fails_on_conflict() {
        let first = Pair("first");
        let second = Pair("second");
        let err = FunctionRegistry::from_sources(&[&first, &second]).unwrap_err();
        assert!(matches!(
            err,
            ValisonError::DuplicateFunction { ref name, kind: FunctionKind::Sanitizer } if name == "shout"
        ));

        let registry = FunctionRegistry::from_sources(&[&first]).unwrap();
        assert_eq!(registry.names(), vec![("shout", FunctionKind::Sanitizer)]);
    }

    #[test]
    fn default_registry_carries_builtins() {
        let registry = default_registry();
        assert_eq!(registry.resolve("trim").unwrap().kind, FunctionKind::Sanitizer);
        assert_eq!(registry.resolve("isLength").unwrap().kind, FunctionKind::Validator);
        assert!(registry.contains("isCreditCard"));
        assert!(!registry.contains("bogus"));
    }
}

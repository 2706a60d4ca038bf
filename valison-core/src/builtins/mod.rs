//! The built-in function library.
//!
//! Three sources make up the default registry:
//!
//! * [`validators::STRING_VALIDATORS`]: string-format checks. The input is
//!   coerced to a string first (`null` and missing values become `""`).
//! * [`checks::TYPE_CHECKS`]: type and shape checks over the raw JSON value.
//! * [`sanitizers::SANITIZERS`]: string transformations.
//!
//! Every validator returns a JSON boolean.
//!
//! License: MIT OR APACHE 2.0

pub mod checks;
pub mod sanitizers;
pub mod validators;

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::errors::ValisonError;
use crate::registry::{FunctionKind, FunctionRegistry, FunctionSource};

/// Plain function pointer signature used by the built-in tables.
pub type BuiltinFn = fn(&Value, &[Value]) -> Value;

/// A static table of functions sharing one kind.
pub struct BuiltinSource {
    label: &'static str,
    kind: FunctionKind,
    table: &'static [(&'static str, BuiltinFn)],
}

impl BuiltinSource {
    pub const fn new(
        label: &'static str,
        kind: FunctionKind,
        table: &'static [(&'static str, BuiltinFn)],
    ) -> Self {
        Self { label, kind, table }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|(name, _)| *name)
    }
}

impl FunctionSource for BuiltinSource {
    fn label(&self) -> &str {
        self.label
    }

    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<(), ValisonError> {
        for (name, function) in self.table {
            registry.register(name, self.kind, *function)?;
        }
        Ok(())
    }
}

/// All built-in sources in registration order.
pub fn sources() -> [&'static dyn FunctionSource; 3] {
    [
        &validators::STRING_VALIDATORS,
        &checks::TYPE_CHECKS,
        &sanitizers::SANITIZERS,
    ]
}

/// String view of a value, the way string-oriented validators see it.
pub(crate) fn coerce_str(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

pub(crate) fn arg_str(args: &[Value], index: usize) -> Option<Cow<'_, str>> {
    match args.get(index) {
        None | Some(Value::Null) => None,
        Some(v) => Some(coerce_str(v)),
    }
}

pub(crate) fn arg_f64(args: &[Value], index: usize) -> Option<f64> {
    match args.get(index)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn arg_bool(args: &[Value], index: usize) -> bool {
    match args.get(index) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => s == "true" || s == "1",
        _ => false,
    }
}

/// Parses the date formats accepted by `isDate`, `isAfter`, `isBefore` and
/// `toDate`. Dates without a zone are taken as UTC.
pub(crate) fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Turns an `f64` into a JSON number, integral when it has no fraction.
/// Non-finite results become `null`.
pub(crate) fn number(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        return Value::from(value as i64);
    }
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_matches_string_view() {
        assert_eq!(coerce_str(&Value::Null), "");
        assert_eq!(coerce_str(&json!("a")), "a");
        assert_eq!(coerce_str(&json!(12)), "12");
        assert_eq!(coerce_str(&json!(true)), "true");
    }

    #[test]
    fn dates_parse_in_common_formats() {
        assert!(parse_date("2014-03-01").is_some());
        assert!(parse_date("2014-03-01T10:20:30Z").is_some());
        assert!(parse_date("2014-03-01 10:20:30").is_some());
        assert!(parse_date("03/01/2014").is_some());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn numbers_stay_integral_when_possible() {
        assert_eq!(number(3.0), json!(3));
        assert_eq!(number(2.5), json!(2.5));
        assert_eq!(number(f64::NAN), Value::Null);
    }

    #[test]
    fn builtin_names_do_not_clash_within_a_kind() {
        let registry = FunctionRegistry::from_sources(&sources()).unwrap();
        let expected: usize = [
            validators::STRING_VALIDATORS.names().count(),
            checks::TYPE_CHECKS.names().count(),
            sanitizers::SANITIZERS.names().count(),
        ]
        .iter()
        .sum();
        assert_eq!(registry.len(), expected);
    }
}

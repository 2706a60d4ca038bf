//! Type and shape checks over raw JSON values.
//!
//! Unlike the string validators these look at the value as it is. A missing
//! value is seen as `null`, so `isNull` and `isUndefined` both hold for it.

use serde_json::Value;

use super::{arg_str, BuiltinSource};
use crate::registry::FunctionKind;

pub static TYPE_CHECKS: BuiltinSource = BuiltinSource::new(
    "type-checks",
    FunctionKind::Validator,
    &[
        ("has", has),
        ("isArray", is_array),
        ("isBoolean", is_boolean),
        ("isEmpty", is_empty),
        ("isEqual", is_equal),
        ("isFinite", is_finite),
        ("isNaN", is_nan),
        ("isNull", is_null),
        ("isNumber", is_number),
        ("isObject", is_object),
        ("isPlainObject", is_plain_object),
        ("isString", is_string),
        ("isUndefined", is_undefined),
    ],
);

fn has(value: &Value, args: &[Value]) -> Value {
    let Some(key) = arg_str(args, 0) else {
        return Value::Bool(false);
    };
    let found = match value {
        Value::Object(map) => map.contains_key(key.as_ref()),
        Value::Array(items) => key.parse::<usize>().is_ok_and(|i| i < items.len()),
        _ => false,
    };
    Value::Bool(found)
}

fn is_array(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_array())
}

fn is_boolean(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_boolean())
}

/// Collections and strings are empty when they hold nothing; scalars that are
/// not collections always count as empty.
fn is_empty(value: &Value, _args: &[Value]) -> Value {
    let empty = match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    };
    Value::Bool(empty)
}

/// Structural equality, comparing numbers by value (`1` equals `1.0`).
pub(crate) fn deep_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        _ => left == right,
    }
}

fn is_equal(value: &Value, args: &[Value]) -> Value {
    let other = args.first().unwrap_or(&Value::Null);
    Value::Bool(deep_equal(value, other))
}

fn is_finite(value: &Value, _args: &[Value]) -> Value {
    let finite = match value {
        Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    };
    Value::Bool(finite)
}

/// JSON numbers are never NaN, so this only holds for strings spelling it.
fn is_nan(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(matches!(value, Value::String(s) if s == "NaN"))
}

fn is_null(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_null())
}

fn is_number(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_number())
}

fn is_object(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_object() || value.is_array())
}

fn is_plain_object(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_object())
}

fn is_string(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_string())
}

fn is_undefined(value: &Value, _args: &[Value]) -> Value {
    Value::Bool(value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emptiness_follows_collection_rules() {
        assert_eq!(is_empty(&Value::Null, &[]), json!(true));
        assert_eq!(is_empty(&json!(""), &[]), json!(true));
        assert_eq!(is_empty(&json!([]), &[]), json!(true));
        assert_eq!(is_empty(&json!({}), &[]), json!(true));
        assert_eq!(is_empty(&json!(7), &[]), json!(true));
        assert_eq!(is_empty(&json!("x"), &[]), json!(false));
        assert_eq!(is_empty(&json!({"a": 1}), &[]), json!(false));
    }

    #[test]
    fn deep_equality_ignores_number_representation() {
        assert!(deep_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert_eq!(is_equal(&json!("a"), &[json!("a")]), json!(true));
    }

    #[test]
    fn shape_checks() {
        assert_eq!(has(&json!({"k": null}), &[json!("k")]), json!(true));
        assert_eq!(has(&json!([1]), &[json!(0)]), json!(true));
        assert_eq!(has(&json!([1]), &[json!(3)]), json!(false));
        assert_eq!(is_string(&json!("s"), &[]), json!(true));
        assert_eq!(is_string(&Value::Null, &[]), json!(false));
        assert_eq!(is_object(&json!([]), &[]), json!(true));
        assert_eq!(is_plain_object(&json!([]), &[]), json!(false));
        assert_eq!(is_finite(&json!("10"), &[]), json!(true));
        assert_eq!(is_finite(&json!("x"), &[]), json!(false));
    }
}

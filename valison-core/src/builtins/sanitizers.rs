//! String sanitizers.
//!
//! A sanitizer's return value replaces the current value in the pipeline. The
//! input is coerced to a string first, so trimming a missing value yields `""`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{arg_bool, arg_f64, arg_str, coerce_str, number, parse_date, BuiltinSource};
use crate::registry::FunctionKind;

pub static SANITIZERS: BuiltinSource = BuiltinSource::new(
    "sanitizers",
    FunctionKind::Sanitizer,
    &[
        ("toString", to_string),
        ("toDate", to_date),
        ("toFloat", to_float),
        ("toInt", to_int),
        ("toBoolean", to_boolean),
        ("trim", trim),
        ("ltrim", ltrim),
        ("rtrim", rtrim),
        ("escape", escape),
        ("stripLow", strip_low),
        ("whitelist", whitelist),
        ("blacklist", blacklist),
        ("toUpperCase", to_upper_case),
        ("toLowerCase", to_lower_case),
        ("reverse", reverse),
    ],
);

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?").unwrap()
});

fn text(s: impl Into<String>) -> Value {
    Value::String(s.into())
}

fn to_string(value: &Value, _args: &[Value]) -> Value {
    text(coerce_str(value))
}

fn to_date(value: &Value, _args: &[Value]) -> Value {
    match parse_date(&coerce_str(value)) {
        Some(date) => text(date.to_rfc3339()),
        None => Value::Null,
    }
}

/// Parses the longest numeric prefix, ignoring trailing garbage.
fn to_float(value: &Value, _args: &[Value]) -> Value {
    if let Value::Number(_) = value {
        return value.clone();
    }
    let s = coerce_str(value);
    FLOAT_PREFIX
        .find(&s)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .map(number)
        .unwrap_or(Value::Null)
}

/// Parses the longest integer prefix in the given radix (default 10).
fn to_int(value: &Value, args: &[Value]) -> Value {
    let radix = arg_f64(args, 0)
        .map(|r| r as u32)
        .filter(|r| (2..=36).contains(r))
        .unwrap_or(10);
    let s = coerce_str(value);
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };
    let prefix: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    match i64::from_str_radix(&prefix, radix) {
        Ok(n) => Value::from(sign * n),
        Err(_) => Value::Null,
    }
}

/// Non-strict: everything except `"0"`, `"false"` and `""` is true.
/// Strict: only `"1"` and `"true"` are true.
fn to_boolean(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    let result = if arg_bool(args, 0) {
        s == "1" || s == "true"
    } else {
        s != "0" && s != "false" && !s.is_empty()
    };
    Value::Bool(result)
}

fn trim_set(args: &[Value]) -> Option<Vec<char>> {
    arg_str(args, 0).map(|chars| chars.chars().collect())
}

fn trim(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    match trim_set(args) {
        Some(set) => text(s.trim_matches(|c: char| set.contains(&c))),
        None => text(s.trim()),
    }
}

fn ltrim(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    match trim_set(args) {
        Some(set) => text(s.trim_start_matches(|c: char| set.contains(&c))),
        None => text(s.trim_start()),
    }
}

fn rtrim(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    match trim_set(args) {
        Some(set) => text(s.trim_end_matches(|c: char| set.contains(&c))),
        None => text(s.trim_end()),
    }
}

fn escape(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    text(out)
}

fn strip_low(value: &Value, args: &[Value]) -> Value {
    let keep_new_lines = arg_bool(args, 0);
    let s = coerce_str(value);
    let kept: String = s
        .chars()
        .filter(|&c| {
            let low = (c as u32) < 0x20 || c == '\u{7F}';
            !low || (keep_new_lines && (c == '\n' || c == '\r'))
        })
        .collect();
    text(kept)
}

fn whitelist(value: &Value, args: &[Value]) -> Value {
    let allowed = arg_str(args, 0).unwrap_or_default();
    let s = coerce_str(value);
    text(s.chars().filter(|c| allowed.contains(*c)).collect::<String>())
}

fn blacklist(value: &Value, args: &[Value]) -> Value {
    let denied = arg_str(args, 0).unwrap_or_default();
    let s = coerce_str(value);
    text(s.chars().filter(|c| !denied.contains(*c)).collect::<String>())
}

fn to_upper_case(value: &Value, _args: &[Value]) -> Value {
    text(coerce_str(value).to_uppercase())
}

fn to_lower_case(value: &Value, _args: &[Value]) -> Value {
    text(coerce_str(value).to_lowercase())
}

/// Reverses arrays element-wise and everything else as a string.
fn reverse(value: &Value, _args: &[Value]) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().rev().cloned().collect()),
        other => text(coerce_str(other).chars().rev().collect::<String>()),
    }
}

// File: valison-core/src/builtins/validators.rs
//! String-format validators.
//!
//! Each validator coerces its input to a string (see [`coerce_str`]) and
//! answers with a JSON boolean. Arguments follow the value, in the order a
//! rule step lists them: `["isLength", 1, 20]` calls `is_length(value, [1, 20])`.
//!
//! License: MIT OR APACHE 2.0

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::Utc;
use log::warn;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use uuid::Uuid;

use super::{arg_f64, arg_str, coerce_str, parse_date, BuiltinSource};
use crate::registry::FunctionKind;

pub static STRING_VALIDATORS: BuiltinSource = BuiltinSource::new(
    "string-validators",
    FunctionKind::Validator,
    &[
        ("equals", equals),
        ("contains", contains),
        ("matches", matches),
        ("isEmail", is_email),
        ("isURL", is_url),
        ("isIP", is_ip),
        ("isAlpha", is_alpha),
        ("isNumeric", is_numeric),
        ("isAlphanumeric", is_alphanumeric),
        ("isBase64", is_base64),
        ("isHexadecimal", is_hexadecimal),
        ("isHexColor", is_hex_color),
        ("isLowercase", is_lowercase),
        ("isUppercase", is_uppercase),
        ("isInt", is_int),
        ("isFloat", is_float),
        ("isDivisibleBy", is_divisible_by),
        ("isLength", is_length),
        ("isByteLength", is_byte_length),
        ("isUUID", is_uuid),
        ("isDate", is_date),
        ("isAfter", is_after),
        ("isBefore", is_before),
        ("isIn", is_in),
        ("isCreditCard", is_credit_card),
        ("isISBN", is_isbn),
        ("isJSON", is_json),
        ("isMultibyte", is_multibyte),
        ("isAscii", is_ascii),
        ("isFullWidth", is_full_width),
        ("isHalfWidth", is_half_width),
        ("isVariableWidth", is_variable_width),
        ("isSurrogatePair", is_surrogate_pair),
    ],
);

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .unwrap()
});

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:https?|ftp)://)?(?:[^\s:@/]+(?::[^\s:@/]*)?@)?(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}|\d{1,3}(?:\.\d{1,3}){3})(?::\d{1,5})?(?:[/?#]\S*)?$",
    )
    .unwrap()
});

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+$").unwrap());
static INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?(?:0|[1-9][0-9]*)$").unwrap());
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:[0-9]+)?(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?$").unwrap()
});
static BASE64: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").unwrap());
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#?(?:[0-9a-f]{3}|[0-9a-f]{6})$").unwrap());
static UUID_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});
static CARD_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|6(?:011|5[0-9]{2})[0-9]{12}|3[47][0-9]{13}|3(?:0[0-5]|[68][0-9])[0-9]{11}|(?:2131|1800|35[0-9]{3})[0-9]{11})$",
    )
    .unwrap()
});

fn verdict(result: bool) -> Value {
    Value::Bool(result)
}

fn equals(value: &Value, args: &[Value]) -> Value {
    let other = args.first().map(coerce_str).unwrap_or_default();
    verdict(coerce_str(value) == other)
}

fn contains(value: &Value, args: &[Value]) -> Value {
    let seed = args.first().map(coerce_str).unwrap_or_default();
    verdict(coerce_str(value).contains(seed.as_ref()))
}

fn matches(value: &Value, args: &[Value]) -> Value {
    let Some(pattern) = arg_str(args, 0) else {
        return verdict(false);
    };
    let flags = arg_str(args, 1).unwrap_or_default();
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build();
    match regex {
        Ok(regex) => verdict(regex.is_match(&coerce_str(value))),
        Err(e) => {
            warn!("matches: invalid pattern '{}': {}", pattern, e);
            verdict(false)
        }
    }
}

fn is_email(value: &Value, _args: &[Value]) -> Value {
    verdict(EMAIL.is_match(&coerce_str(value)))
}

fn is_url(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(s.len() < 2083 && URL.is_match(&s))
}

fn is_ip(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    let v4 = || s.parse::<Ipv4Addr>().is_ok();
    let v6 = || s.parse::<Ipv6Addr>().is_ok();
    let result = match arg_str(args, 0).as_deref() {
        Some("4") => v4(),
        Some("6") => v6(),
        _ => v4() || v6(),
    };
    verdict(result)
}

fn is_alpha(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(!s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_numeric(value: &Value, _args: &[Value]) -> Value {
    verdict(NUMERIC.is_match(&coerce_str(value)))
}

fn is_alphanumeric(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(!s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn is_base64(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(s.len() % 4 == 0 && BASE64.is_match(&s))
}

fn is_hexadecimal(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(!s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_hex_color(value: &Value, _args: &[Value]) -> Value {
    verdict(HEX_COLOR.is_match(&coerce_str(value)))
}

fn is_lowercase(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(s == s.to_lowercase())
}

fn is_uppercase(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(s == s.to_uppercase())
}

fn is_int(value: &Value, _args: &[Value]) -> Value {
    verdict(INT.is_match(&coerce_str(value)))
}

fn is_float(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(!s.is_empty() && s != "." && FLOAT.is_match(&s))
}

fn is_divisible_by(value: &Value, args: &[Value]) -> Value {
    let number = coerce_str(value).trim().parse::<f64>().ok();
    match (number, arg_f64(args, 0)) {
        (Some(n), Some(d)) if d != 0.0 => verdict(n % d == 0.0),
        _ => verdict(false),
    }
}

fn within(len: usize, args: &[Value]) -> bool {
    let min = arg_f64(args, 0).unwrap_or(0.0);
    let max = arg_f64(args, 1);
    let len = len as f64;
    len >= min && max.map_or(true, |max| len <= max)
}

fn is_length(value: &Value, args: &[Value]) -> Value {
    verdict(within(coerce_str(value).chars().count(), args))
}

fn is_byte_length(value: &Value, args: &[Value]) -> Value {
    verdict(within(coerce_str(value).len(), args))
}

fn is_uuid(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    if !UUID_SHAPE.is_match(&s) {
        return verdict(false);
    }
    let Ok(uuid) = Uuid::try_parse(&s) else {
        return verdict(false);
    };
    let result = match arg_str(args, 0).as_deref() {
        None | Some("all") => true,
        Some(version) => version
            .parse::<usize>()
            .is_ok_and(|v| uuid.get_version_num() == v),
    };
    verdict(result)
}

fn is_date(value: &Value, _args: &[Value]) -> Value {
    verdict(parse_date(&coerce_str(value)).is_some())
}

fn is_after(value: &Value, args: &[Value]) -> Value {
    let reference = match arg_str(args, 0) {
        Some(s) => parse_date(&s),
        None => Some(Utc::now()),
    };
    match (parse_date(&coerce_str(value)), reference) {
        (Some(date), Some(reference)) => verdict(date > reference),
        _ => verdict(false),
    }
}

fn is_before(value: &Value, args: &[Value]) -> Value {
    let reference = match arg_str(args, 0) {
        Some(s) => parse_date(&s),
        None => Some(Utc::now()),
    };
    match (parse_date(&coerce_str(value)), reference) {
        (Some(date), Some(reference)) => verdict(date < reference),
        _ => verdict(false),
    }
}

fn is_in(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    let result = match args.first() {
        Some(Value::Array(options)) => options.iter().any(|o| coerce_str(o) == s),
        Some(Value::Object(options)) => options.contains_key(s.as_ref()),
        Some(Value::String(options)) => options.contains(s.as_ref()),
        _ => false,
    };
    verdict(result)
}

/// Validates a number using the Luhn algorithm.
///
/// The Luhn algorithm, also known as the Mod 10 algorithm, is a simple checksum
/// formula used to validate a variety of identification numbers, such as
/// credit card numbers.
pub fn is_valid_luhn(num_str: &str) -> bool {
    let mut sum = 0;
    let mut alternate = false;

    for c in num_str.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };

        if alternate {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        alternate = !alternate;
    }

    sum % 10 == 0
}

/// Strips everything but digits, checks the issuer prefix and length, then
/// applies the Luhn checksum.
pub fn is_valid_credit_card(cc_number: &str) -> bool {
    let digits: String = cc_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || !CARD_PREFIX.is_match(&digits) {
        return false;
    }
    is_valid_luhn(&digits)
}

fn is_credit_card(value: &Value, _args: &[Value]) -> Value {
    verdict(is_valid_credit_card(&coerce_str(value)))
}

fn is_isbn10(digits: &str) -> bool {
    let chars: Vec<char> = digits.chars().collect();
    if chars.len() != 10 {
        return false;
    }
    let mut checksum = 0;
    for (i, c) in chars.iter().enumerate() {
        let digit = match (i, c) {
            (9, 'X') | (9, 'x') => 10,
            (_, c) => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        checksum += (i as u32 + 1) * digit;
    }
    checksum % 11 == 0
}

fn is_isbn13(digits: &str) -> bool {
    if digits.len() != 13 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let checksum: u32 = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    checksum % 10 == 0
}

fn is_isbn(value: &Value, args: &[Value]) -> Value {
    let s = coerce_str(value);
    let compact: String = s.chars().filter(|c| *c != '-' && *c != ' ').collect();
    let result = match arg_str(args, 0).as_deref() {
        Some("10") => is_isbn10(&compact),
        Some("13") => is_isbn13(&compact),
        _ => is_isbn10(&compact) || is_isbn13(&compact),
    };
    verdict(result)
}

fn is_json(value: &Value, _args: &[Value]) -> Value {
    let parsed = serde_json::from_str::<Value>(&coerce_str(value));
    verdict(matches!(parsed, Ok(Value::Object(_)) | Ok(Value::Array(_))))
}

fn is_multibyte(value: &Value, _args: &[Value]) -> Value {
    verdict(coerce_str(value).chars().any(|c| !c.is_ascii()))
}

fn is_ascii(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(!s.is_empty() && s.is_ascii())
}

const HALF_WIDTH_RANGES: [(u32, u32); 4] =
    [(0x20, 0x7E), (0xFF61, 0xFF9F), (0xFFA0, 0xFFDC), (0xFFE8, 0xFFEE)];

fn half_width(c: char) -> bool {
    let code = c as u32;
    HALF_WIDTH_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&code))
}

fn is_full_width(value: &Value, _args: &[Value]) -> Value {
    verdict(coerce_str(value).chars().any(|c| !half_width(c)))
}

fn is_half_width(value: &Value, _args: &[Value]) -> Value {
    verdict(coerce_str(value).chars().any(half_width))
}

fn is_variable_width(value: &Value, _args: &[Value]) -> Value {
    let s = coerce_str(value);
    verdict(s.chars().any(half_width) && s.chars().any(|c| !half_width(c)))
}

fn is_surrogate_pair(value: &Value, _args: &[Value]) -> Value {
    verdict(coerce_str(value).chars().any(|c| c as u32 > 0xFFFF))
}

//! Tree-walking evaluator over a restricted set of bindings.

use serde_json::Value;

use super::parser::{BinaryOp, Expr, UnaryOp};
use crate::builtins::checks::deep_equal;
use crate::builtins::{coerce_str, number};
use crate::registry::RegistryEntry;

/// Names visible to an expression.
///
/// Variables and functions live in separate namespaces: an identifier in call
/// position is looked up with [`Bindings::function`], anywhere else with
/// [`Bindings::variable`].
pub trait Bindings {
    fn variable(&self, name: &str) -> Option<&Value>;
    fn function(&self, name: &str) -> Option<RegistryEntry>;
}

/// Truthiness: `null`, `false`, `0`, and `""` are false; everything else,
/// including empty arrays and objects, is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn evaluate(expr: &Expr, bindings: &dyn Bindings) -> Result<Value, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => match bindings.variable(name) {
            Some(value) => Ok(value.clone()),
            None if bindings.function(name).is_some() => {
                Err(format!("function '{}' must be called", name))
            }
            None => Err(format!("unknown identifier '{}'", name)),
        },
        Expr::Member(target, name) => {
            let target = evaluate(target, bindings)?;
            Ok(property(&target, name))
        }
        Expr::Index(target, index) => {
            let target = evaluate(target, bindings)?;
            let index = evaluate(index, bindings)?;
            Ok(property(&target, &coerce_str(&index)))
        }
        Expr::Call(name, args) => {
            let Some(function) = bindings.function(name) else {
                return Err(if bindings.variable(name).is_some() {
                    format!("'{}' is not a function", name)
                } else {
                    format!("unknown function '{}'", name)
                });
            };
            let mut values = args
                .iter()
                .map(|arg| evaluate(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            let subject = if values.is_empty() {
                Value::Null
            } else {
                values.remove(0)
            };
            Ok(function.invoke(&subject, &values))
        }
        Expr::Unary(UnaryOp::Not, operand) => {
            let value = evaluate(operand, bindings)?;
            Ok(Value::Bool(!truthy(&value)))
        }
        Expr::Unary(UnaryOp::Neg, operand) => {
            let value = evaluate(operand, bindings)?;
            match value.as_f64() {
                Some(n) => Ok(number(-n)),
                None => Err(format!("cannot negate {}", describe(&value))),
            }
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = evaluate(left, bindings)?;
            if truthy(&left) {
                evaluate(right, bindings)
            } else {
                Ok(left)
            }
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = evaluate(left, bindings)?;
            if truthy(&left) {
                Ok(left)
            } else {
                evaluate(right, bindings)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, bindings)?;
            let right = evaluate(right, bindings)?;
            binary(*op, &left, &right)
        }
    }
}

/// Property lookup that never fails: anything missing reads as `null`.
fn property(target: &Value, name: &str) -> Value {
    match target {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        Value::Array(items) if name == "length" => Value::from(items.len()),
        Value::Array(items) => name
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null),
        Value::String(s) if name == "length" => Value::from(s.chars().count()),
        _ => Value::Null,
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, String> {
    let value = match op {
        BinaryOp::Eq => Value::Bool(deep_equal(left, right)),
        BinaryOp::Ne => Value::Bool(!deep_equal(left, right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            // Values of different types are unordered; every comparison is false.
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let holds = ordering.is_some_and(|ord| match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Le => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            });
            Value::Bool(holds)
        }
        BinaryOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", coerce_str(left), coerce_str(right)))
            }
            _ => arithmetic(op, left, right)?,
        },
        _ => arithmetic(op, left, right)?,
    };
    Ok(value)
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, String> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(format!(
            "arithmetic needs numbers, got {} and {}",
            describe(left),
            describe(right)
        ));
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    };
    Ok(number(result))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

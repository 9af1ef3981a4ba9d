//! Context-sensitive coercion.

use serde::Serialize;

use crate::ast::BinaryOp;

use super::Value;

/// The evaluation context an expression is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Context {
    /// A number is expected; arrays read as their length.
    Scalar,
    /// A truth value is expected.
    Boolean,
    /// Text is expected.
    Str,
    /// No expectation; Nothing stays Nothing.
    Normal,
}

/// Coerce a value for a context.
///
/// Numbers and booleans always pass through. Nothing becomes `false`, `0`
/// or `"null"`; Mysterious becomes `"mysterious"` for text, `false` for
/// truth and stays Mysterious otherwise; arrays become their length for
/// numbers and truth.
pub fn coerce(value: &Value, context: Context) -> Value {
    match (value, context) {
        (Value::Number(_) | Value::Boolean(_), _) => value.clone(),
        (_, Context::Normal) => value.clone(),
        (Value::Nothing, Context::Boolean) => Value::Boolean(false),
        (Value::Nothing, Context::Scalar) => Value::Number(0.0),
        (Value::Nothing, Context::Str) => Value::from("null"),
        (Value::Mysterious, Context::Str) => Value::from("mysterious"),
        (Value::Mysterious, Context::Boolean) => Value::Boolean(false),
        (Value::Mysterious, Context::Scalar) => Value::Mysterious,
        (Value::Array(arr), Context::Scalar | Context::Boolean) => {
            Value::Number(arr.borrow().len() as f64)
        }
        _ => value.clone(),
    }
}

/// Coerce Nothing away relative to the other operand of a binary operation.
///
/// Addition keeps nulls visible: next to a string, Nothing becomes `"null"`.
/// Every other operation turns it into the partner type's empty value
/// (`0`, `""` or `false`). Non-Nothing values are returned unchanged.
pub fn coerce_relative(value: &Value, partner: &Value, operation: BinaryOp) -> Value {
    if !value.is_nothing() {
        return value.clone();
    }
    match partner {
        Value::String(_) if operation == BinaryOp::Add => Value::from("null"),
        Value::String(_) => Value::from(""),
        Value::Boolean(_) => Value::Boolean(false),
        Value::Nothing => Value::Nothing,
        _ => Value::Number(0.0),
    }
}

//! Operations on values: arithmetic, comparison and the statement-level
//! transformations (increment, rounding, cast, split, join).

use std::cmp::Ordering;

use crate::ast::{BinaryOp, RoundMode};
use crate::error::RuntimeError;
use crate::span::Span;

use super::coerce::coerce_relative;
use super::number::{divide as decimal_divide, parse_radix};
use super::{RockstarArray, Value};

/// Arrays take part in arithmetic and comparison through their length.
fn length_of_arrays(value: Value) -> Value {
    match value {
        Value::Array(arr) => Value::Number(arr.borrow().len() as f64),
        other => other,
    }
}

fn operands(a: &Value, b: &Value, op: BinaryOp) -> (Value, Value) {
    let left = length_of_arrays(coerce_relative(a, b, op));
    let right = length_of_arrays(coerce_relative(b, a, op));
    (left, right)
}

/// Numeric view of a value: booleans count as 1/0, Nothing as 0.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Nothing => Some(0.0),
        _ => None,
    }
}

/// Why an arithmetic operator cannot take a string operand, if it cannot.
pub fn string_operand_error(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::Subtract => Some("Subtraction of strings is not possible."),
        // TODO: string repetition ("la" times 3) once the semantics for
        // fractional counts are settled.
        BinaryOp::Multiply => Some("Multiplication of strings not yet implemented."),
        BinaryOp::Divide => Some("Division of strings is not possible."),
        _ => None,
    }
}

fn reject_strings(a: &Value, b: &Value, op: BinaryOp, span: Span) -> Result<(), RuntimeError> {
    match string_operand_error(op) {
        Some(message) if is_string(a) || is_string(b) => {
            Err(RuntimeError::unsupported_operation(message, span))
        }
        _ => Ok(()),
    }
}

fn is_string(value: &Value) -> bool {
    matches!(value, Value::String(_))
}

fn numeric_pair(
    a: &Value,
    b: &Value,
    verb: &str,
    span: Span,
) -> Result<(f64, f64), RuntimeError> {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(RuntimeError::unsupported_operation(
            format!("Cannot {} {} and {}", verb, a.type_name(), b.type_name()),
            span,
        )),
    }
}

/// Evaluate an arithmetic or comparison operator on two runtime values.
pub fn binary(op: BinaryOp, a: &Value, b: &Value, span: Span) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => add(a, b, span),
        BinaryOp::Subtract => subtract(a, b, span),
        BinaryOp::Multiply => multiply(a, b, span),
        BinaryOp::Divide => divide(a, b, span),
        BinaryOp::Equal => Ok(Value::Boolean(equals(a, b))),
        BinaryOp::NotEqual => Ok(Value::Boolean(!equals(a, b))),
        BinaryOp::Greater
        | BinaryOp::Less
        | BinaryOp::GreaterEqual
        | BinaryOp::LessEqual => compare(op, a, b, span).map(Value::Boolean),
        BinaryOp::And => Ok(Value::Boolean(a.is_truthy() && b.is_truthy())),
        BinaryOp::Or => Ok(Value::Boolean(a.is_truthy() || b.is_truthy())),
        BinaryOp::Nor => Ok(Value::Boolean(!(a.is_truthy() || b.is_truthy()))),
    }
}

/// Addition. Any string operand turns the whole thing into concatenation.
pub fn add(a: &Value, b: &Value, span: Span) -> Result<Value, RuntimeError> {
    let (a, b) = operands(a, b, BinaryOp::Add);
    if is_string(&a) || is_string(&b) {
        return Ok(Value::String(format!("{}{}", a, b)));
    }
    if a.is_mysterious() || b.is_mysterious() {
        return Ok(Value::Mysterious);
    }
    let (x, y) = numeric_pair(&a, &b, "add", span)?;
    Ok(Value::Number(x + y))
}

pub fn subtract(a: &Value, b: &Value, span: Span) -> Result<Value, RuntimeError> {
    let (a, b) = operands(a, b, BinaryOp::Subtract);
    reject_strings(&a, &b, BinaryOp::Subtract, span)?;
    if a.is_mysterious() || b.is_mysterious() {
        return Ok(Value::Mysterious);
    }
    let (x, y) = numeric_pair(&a, &b, "subtract", span)?;
    Ok(Value::Number(x - y))
}

pub fn multiply(a: &Value, b: &Value, span: Span) -> Result<Value, RuntimeError> {
    let (a, b) = operands(a, b, BinaryOp::Multiply);
    reject_strings(&a, &b, BinaryOp::Multiply, span)?;
    if a.is_mysterious() || b.is_mysterious() {
        return Ok(Value::Mysterious);
    }
    let (x, y) = numeric_pair(&a, &b, "multiply", span)?;
    Ok(Value::Number(x * y))
}

pub fn divide(a: &Value, b: &Value, span: Span) -> Result<Value, RuntimeError> {
    let (a, b) = operands(a, b, BinaryOp::Divide);
    reject_strings(&a, &b, BinaryOp::Divide, span)?;
    if a.is_mysterious() || b.is_mysterious() {
        return Ok(Value::Mysterious);
    }
    let (x, y) = numeric_pair(&a, &b, "divide", span)?;
    decimal_divide(x, y)
        .map(Value::Number)
        .ok_or_else(|| RuntimeError::division_by_zero(span))
}

/// Equality. Mysterious only equals Mysterious; everything else is compared
/// by value once Nothing has been coerced towards the other side.
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Mysterious, Value::Mysterious) => true,
        (Value::Mysterious, _) | (_, Value::Mysterious) => false,
        _ => {
            let (left, right) = (
                coerce_relative(a, b, BinaryOp::Equal),
                coerce_relative(b, a, BinaryOp::Equal),
            );
            left == right
        }
    }
}

/// Ordering comparison for `<`, `>`, `<=` and `>=`.
pub fn compare(op: BinaryOp, a: &Value, b: &Value, span: Span) -> Result<bool, RuntimeError> {
    if a.is_mysterious() || b.is_mysterious() {
        return Ok(false);
    }
    let (a, b) = operands(a, b, op);
    let ordering = match (&a, &b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::Nothing, Value::Nothing) => Some(Ordering::Equal),
        _ => {
            return Err(RuntimeError::cannot_compare(
                a.type_name(),
                b.type_name(),
                span,
            ))
        }
    };
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        BinaryOp::Greater => ordering == Ordering::Greater,
        BinaryOp::Less => ordering == Ordering::Less,
        BinaryOp::GreaterEqual => ordering != Ordering::Less,
        BinaryOp::LessEqual => ordering != Ordering::Greater,
        _ => false,
    })
}

/// `Build X up`: numbers count up, Nothing counts from zero, anything else
/// but Mysterious gets a "1" appended per step.
pub fn increment(value: &Value, count: u16, span: Span) -> Result<Value, RuntimeError> {
    Ok(match value {
        Value::Nothing => Value::Number(count as f64),
        Value::Number(n) => Value::Number(n + count as f64),
        Value::Mysterious => {
            return Err(RuntimeError::unsupported_operation("Cannot build up mysterious", span))
        }
        other => Value::String(format!("{}{}", other, "1".repeat(count as usize))),
    })
}

/// `Knock X down`: numbers count down, Nothing counts from zero, anything
/// else but Mysterious becomes the string "NaN".
pub fn decrement(value: &Value, count: u16, span: Span) -> Result<Value, RuntimeError> {
    Ok(match value {
        Value::Nothing => Value::Number(-(count as f64)),
        Value::Number(n) => Value::Number(n - count as f64),
        Value::Mysterious => {
            return Err(RuntimeError::unsupported_operation("Cannot knock down mysterious", span))
        }
        _ => Value::from("NaN"),
    })
}

/// `Turn X up/down/round`.
pub fn round(value: &Value, mode: RoundMode, span: Span) -> Result<Value, RuntimeError> {
    let n = match value {
        Value::Number(n) => *n,
        Value::Nothing => 0.0,
        other => return Err(RuntimeError::cannot_round(other.type_name(), span)),
    };
    let rounded = match mode {
        RoundMode::Up => n.ceil(),
        RoundMode::Down => n.floor(),
        RoundMode::Nearest => (n + 0.5).floor(),
    };
    Ok(Value::Number(rounded))
}

/// `Cast X [with radix]`: strings parse to numbers, numbers become the
/// character at that code point.
pub fn cast(value: &Value, radix: Option<&Value>, span: Span) -> Result<Value, RuntimeError> {
    match value {
        Value::String(s) => match radix {
            Some(radix) => {
                let base = numeric(radix).unwrap_or(10.0);
                parse_radix(s, base)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        RuntimeError::invalid_cast(format!("'{}' with radix {}", s, radix), span)
                    })
            }
            None => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| RuntimeError::invalid_cast(format!("'{}' to a number", s), span)),
        },
        Value::Number(n) => {
            let code = *n as i64;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| {
                    RuntimeError::invalid_cast(format!("{} to a character", value), span)
                })
        }
        other => Err(RuntimeError::invalid_cast(
            format!("{} to a number or character", other.type_name()),
            span,
        )),
    }
}

/// `Split X [with delimiter]`. Without a delimiter the text splits into
/// characters; trailing empty pieces are dropped.
pub fn split(value: &Value, delimiter: Option<&Value>) -> Value {
    let text = value.to_string();
    let mut pieces: Vec<String> = match delimiter.map(|d| d.to_string()) {
        Some(delim) if !delim.is_empty() => text.split(delim.as_str()).map(str::to_string).collect(),
        _ => text.chars().map(|c| c.to_string()).collect(),
    };
    while pieces.last().is_some_and(|p| p.is_empty()) {
        pieces.pop();
    }
    let mut array = RockstarArray::new();
    array.add_all(pieces.into_iter().map(Value::String));
    Value::new_array(array)
}

/// `Join X [with delimiter]`.
pub fn join(value: &Value, delimiter: Option<&Value>, span: Span) -> Result<Value, RuntimeError> {
    match value {
        Value::Array(arr) => {
            let delim = delimiter.map(|d| d.to_string()).unwrap_or_default();
            Ok(Value::String(arr.borrow().join(&delim)))
        }
        other => Err(RuntimeError::not_an_array(other.type_name(), span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn test_add_numbers_and_strings() {
        let n = |x| Value::Number(x);
        assert_eq!(add(&n(1.0), &n(2.0), span()).unwrap(), n(3.0));
        assert_eq!(add(&Value::from("n"), &n(5.0), span()).unwrap(), Value::from("n5"));
        assert_eq!(add(&n(0.5), &Value::from("!"), span()).unwrap(), Value::from("0.5!"));
        assert_eq!(add(&Value::Boolean(true), &n(1.0), span()).unwrap(), n(2.0));
    }

    #[test]
    fn test_add_keeps_nulls_visible() {
        let result = add(&Value::Nothing, &Value::from(" song"), span()).unwrap();
        assert_eq!(result, Value::from("null song"));
        let result = add(&Value::Nothing, &Value::Number(4.0), span()).unwrap();
        assert_eq!(result, Value::Number(4.0));
        let result = add(&Value::Mysterious, &Value::from("!"), span()).unwrap();
        assert_eq!(result, Value::from("mysterious!"));
    }

    #[test]
    fn test_string_arithmetic_is_rejected() {
        let err = subtract(&Value::from("a"), &Value::Number(1.0), span()).unwrap_err();
        assert!(err.to_string().contains("Subtraction of strings"));
        let err = multiply(&Value::from("a"), &Value::Number(2.0), span()).unwrap_err();
        assert!(err.to_string().contains("Multiplication of strings"));
    }

    #[test]
    fn test_divide() {
        let result = divide(&Value::Number(10.0), &Value::Number(4.0), span()).unwrap();
        assert_eq!(result, Value::Number(2.5));
        assert!(matches!(
            divide(&Value::Number(1.0), &Value::Nothing, span()),
            Err(RuntimeError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_equality_rules() {
        assert!(equals(&Value::Mysterious, &Value::Mysterious));
        assert!(!equals(&Value::Mysterious, &Value::Nothing));
        assert!(equals(&Value::Nothing, &Value::Nothing));
        assert!(equals(&Value::Nothing, &Value::Number(0.0)));
        assert!(equals(&Value::Nothing, &Value::from("")));
        assert!(equals(&Value::Nothing, &Value::Boolean(false)));
        assert!(!equals(&Value::Nothing, &Value::Number(1.0)));
        assert!(!equals(&Value::from("1"), &Value::Number(1.0)));
    }

    #[test]
    fn test_compare() {
        let n = |x| Value::Number(x);
        assert!(compare(BinaryOp::Greater, &n(3.0), &n(2.0), span()).unwrap());
        assert!(compare(BinaryOp::LessEqual, &Value::Nothing, &n(0.0), span()).unwrap());
        assert!(compare(BinaryOp::Less, &Value::from("a"), &Value::from("b"), span()).unwrap());
        assert!(!compare(BinaryOp::Less, &Value::Mysterious, &n(1.0), span()).unwrap());
        assert!(compare(BinaryOp::Less, &Value::from("a"), &n(1.0), span()).is_err());
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(increment(&Value::Nothing, 1, span()).unwrap(), Value::Number(1.0));
        assert_eq!(increment(&Value::Number(2.0), 2, span()).unwrap(), Value::Number(4.0));
        assert_eq!(increment(&Value::from("a"), 1, span()).unwrap(), Value::from("a1"));
        assert_eq!(decrement(&Value::Number(3.0), 1, span()).unwrap(), Value::Number(2.0));
        assert_eq!(decrement(&Value::from("a"), 1, span()).unwrap(), Value::from("NaN"));
    }

    #[test]
    fn test_mysterious_cannot_count() {
        assert!(matches!(
            increment(&Value::Mysterious, 1, span()),
            Err(RuntimeError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            decrement(&Value::Mysterious, 3, span()),
            Err(RuntimeError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_round() {
        let n = |x| Value::Number(x);
        assert_eq!(round(&n(2.5), RoundMode::Nearest, span()).unwrap(), n(3.0));
        assert_eq!(round(&n(-2.5), RoundMode::Nearest, span()).unwrap(), n(-2.0));
        assert_eq!(round(&n(2.1), RoundMode::Up, span()).unwrap(), n(3.0));
        assert_eq!(round(&n(2.9), RoundMode::Down, span()).unwrap(), n(2.0));
        assert!(round(&Value::from("x"), RoundMode::Up, span()).is_err());
    }

    #[test]
    fn test_cast() {
        assert_eq!(cast(&Value::from("3.5"), None, span()).unwrap(), Value::Number(3.5));
        assert_eq!(
            cast(&Value::from("ff"), Some(&Value::Number(16.0)), span()).unwrap(),
            Value::Number(255.0)
        );
        assert_eq!(cast(&Value::Number(65.0), None, span()).unwrap(), Value::from("A"));
        assert!(cast(&Value::from("nope"), None, span()).is_err());
    }

    #[test]
    fn test_split_and_join() {
        let parts = split(&Value::from("a,b,,"), Some(&Value::from(",")));
        let Value::Array(arr) = &parts else {
            panic!("expected array");
        };
        assert_eq!(arr.borrow().len(), 2);
        assert_eq!(join(&parts, Some(&Value::from("-")), span()).unwrap(), Value::from("a-b"));

        let chars = split(&Value::from("abc"), None);
        assert_eq!(join(&chars, None, span()).unwrap(), Value::from("abc"));
        assert!(join(&Value::from("abc"), None, span()).is_err());
    }
}

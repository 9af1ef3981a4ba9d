//! Runtime values and the coercion rules between them.

pub mod array;
pub mod coerce;
pub mod number;
pub mod ops;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::vm::chunk::FunctionProto;

pub use array::RockstarArray;
pub use coerce::{coerce, coerce_relative, Context};
pub use number::format_number;

/// A Rockstar runtime value.
///
/// `Nothing` is the language's explicit null: a real value that reads as 0,
/// false or "" depending on where it is used. `Mysterious` is the undefined
/// value: it has no type and only equals another `Mysterious`.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Nothing,
    Mysterious,
    Array(Rc<RefCell<RockstarArray>>),
    Function(Rc<FunctionProto>),
}

impl Value {
    pub fn new_array(array: RockstarArray) -> Self {
        Value::Array(Rc::new(RefCell::new(array)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Nothing => "Nothing",
            Value::Mysterious => "Mysterious",
            Value::Array(_) => "Array",
            Value::Function(_) => "Function",
        }
    }

    /// Truthiness in a boolean context.
    ///
    /// Nothing, Mysterious, `false` and anything equal to 0 are falsy.
    /// Strings are always truthy; arrays are truthy when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Nothing | Value::Mysterious => false,
            Value::String(_) | Value::Function(_) => true,
            Value::Array(arr) => arr.borrow().len() != 0,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    pub fn is_mysterious(&self) -> bool {
        matches!(self, Value::Mysterious)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Nothing, Value::Nothing) => true,
            (Value::Mysterious, Value::Mysterious) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// How a value prints on its own: numbers without trailing zeros, Nothing
/// as an empty line, Mysterious as the word itself, arrays as their length.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Nothing => Ok(()),
            Value::Mysterious => f.write_str("mysterious"),
            Value::Array(arr) => f.write_str(&format_number(arr.borrow().len() as f64)),
            Value::Function(proto) => write!(f, "<function {}>", proto.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nothing.is_truthy());
        assert!(!Value::Mysterious.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-2.5).is_truthy());
        assert!(Value::from("").is_truthy());
        assert!(!Value::new_array(RockstarArray::new()).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Nothing.to_string(), "");
        assert_eq!(Value::Mysterious.to_string(), "mysterious");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(0.0), Value::Nothing);
        assert_ne!(Value::Nothing, Value::Mysterious);
        assert_ne!(Value::from("1"), Value::Number(1.0));
    }
}

//! The Rockstar array: an ordered list fused with a string-keyed map.

use ahash::RandomState;
use indexmap::IndexMap;

use super::number::format_number;
use super::Value;

/// Highest list index a write may pad up to.
pub const MAX_INDEX: usize = 1 << 24;

/// Where a key lands inside a [`RockstarArray`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayKey {
    /// A non-negative integral key addresses the ordered list.
    Index(usize),
    /// Anything else is a map key.
    Key(String),
}

impl ArrayKey {
    /// Classify a key value. Numeric strings that hold a whole number count
    /// as list indices, so `"4"` and `4` address the same element.
    pub fn from_value(key: &Value) -> Self {
        match key {
            Value::Number(n) => Self::from_number(*n).unwrap_or_else(|| Self::Key(format_number(*n))),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) => Self::from_number(n).unwrap_or_else(|| Self::Key(s.clone())),
                Err(_) => Self::Key(s.clone()),
            },
            Value::Nothing => Self::Index(0),
            other => Self::Key(other.to_string()),
        }
    }

    fn from_number(n: f64) -> Option<Self> {
        if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
            Some(Self::Index(n as usize))
        } else {
            None
        }
    }
}

/// An ordered sequence of values plus a string-keyed map.
///
/// Only the ordered part counts towards [`len`](Self::len).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RockstarArray {
    list: Vec<Value>,
    map: IndexMap<String, Value, RandomState>,
}

impl RockstarArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: Value) {
        self.list.push(value);
    }

    pub fn add_all(&mut self, values: impl IntoIterator<Item = Value>) {
        self.list.extend(values);
    }

    /// Write at a list index, padding any gap with Nothing. Returns false,
    /// writing nothing, when the index is past [`MAX_INDEX`].
    #[must_use]
    pub fn set_index(&mut self, index: usize, value: Value) -> bool {
        if index > MAX_INDEX {
            return false;
        }
        if index >= self.list.len() {
            self.list.resize(index, Value::Nothing);
            self.list.push(value);
        } else {
            self.list[index] = value;
        }
        true
    }

    pub fn set_key(&mut self, key: impl Into<String>, value: Value) {
        self.map.insert(key.into(), value);
    }

    /// Write under any key. False when a list index is too large to pad to.
    #[must_use]
    pub fn set(&mut self, key: &Value, value: Value) -> bool {
        match ArrayKey::from_value(key) {
            ArrayKey::Index(i) => self.set_index(i, value),
            ArrayKey::Key(k) => {
                self.set_key(k, value);
                true
            }
        }
    }

    /// Read an element. Anything never written is Mysterious.
    pub fn get(&self, key: &Value) -> Value {
        let found = match ArrayKey::from_value(key) {
            ArrayKey::Index(i) => self.list.get(i),
            ArrayKey::Key(k) => self.map.get(&k),
        };
        found.cloned().unwrap_or(Value::Mysterious)
    }

    /// Remove and return the first element, or Mysterious when empty.
    pub fn pop_front(&mut self) -> Value {
        if self.list.is_empty() {
            Value::Mysterious
        } else {
            self.list.remove(0)
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn join(&self, delimiter: &str) -> String {
        self.list
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

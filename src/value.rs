//! The default stored value type.
//!
//! [`Value`] is a tagged union over the payload kinds a general-purpose cache
//! usually holds. Numbers are kept with their exact primitive kind so numeric
//! deltas operate in the type the caller stored.

use crate::numeric::{Number, NumericValue};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A value stored in a `Cache<Value>`.
///
/// # Example
///
/// ```
/// use flashcache::{Number, Value};
///
/// let v = Value::from(5i32);
/// assert_eq!(v.as_number(), Some(Number::I32(5)));
/// assert_eq!(Value::from("hello").as_str(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Value {
    Number(Number),
    Text(String),
    Bytes(Bytes),
    Bool(bool),
    Json(serde_json::Value),
}

impl Value {
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Short name of the payload kind (the numeric kind for numbers).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(n) => n.kind(),
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Bool(_) => "bool",
            Value::Json(_) => "json",
        }
    }
}

impl NumericValue for Value {
    fn to_number(&self) -> Option<Number> {
        self.as_number()
    }

    fn from_number(number: Number) -> Option<Self> {
        Some(Value::Number(number))
    }

    fn type_name(&self) -> &'static str {
        Value::type_name(self)
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

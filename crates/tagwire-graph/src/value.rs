//! Scalar tag property values.
//!
//! Host containers restrict tag properties to scalars; structured data
//! travels through the flattened `i<group>_<property>` encoding handled by
//! the compile layer.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Properties attached to one tag instance, in declaration order.
pub type TagProperties = IndexMap<String, TagValue>;

/// A scalar value carried by a tag property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// UTF-8 string property.
    Str(String),
    /// Signed integer property (priorities, group indices).
    Int(i64),
    /// Boolean property (`prioritized`, `proxy`, ...).
    Bool(bool),
}

impl TagValue {
    /// The kind of this value, for type assertions and diagnostics.
    pub fn kind(&self) -> ValueKind {
        match self {
            TagValue::Str(_) => ValueKind::Str,
            TagValue::Int(_) => ValueKind::Int,
            TagValue::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TagValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(value) => f.write_str(value),
            TagValue::Int(value) => write!(f, "{value}"),
            TagValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(i64::from(value))
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

/// Kinds a [`TagValue`] can take, used in type-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Bool,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Str => "string",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

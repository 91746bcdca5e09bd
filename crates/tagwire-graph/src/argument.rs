//! Argument slots and the values bound to them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::TagValue;

/// Addressable constructor or method argument slot.
///
/// Slots are either positional (`0`, `1`, ...) or named (`$handler`). Tag
/// properties address slots with an integer or a `$`-prefixed string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgumentSlot {
    Index(usize),
    Name(String),
}

// Slots key argument maps; serialize them as strings so the graph
// round-trips through JSON.
impl Serialize for ArgumentSlot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArgumentSlot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.parse::<usize>() {
            Ok(index) => Ok(ArgumentSlot::Index(index)),
            Err(_) => Ok(ArgumentSlot::Name(raw)),
        }
    }
}

impl ArgumentSlot {
    /// Interprets a scalar tag property as a slot. Integers address
    /// positional slots, strings named ones; booleans and negative indices
    /// have no slot interpretation.
    pub fn from_value(value: &TagValue) -> Option<ArgumentSlot> {
        match value {
            TagValue::Int(index) => usize::try_from(*index).ok().map(ArgumentSlot::Index),
            TagValue::Str(name) => Some(ArgumentSlot::Name(name.clone())),
            TagValue::Bool(_) => None,
        }
    }
}

impl Default for ArgumentSlot {
    fn default() -> Self {
        ArgumentSlot::Index(0)
    }
}

impl fmt::Display for ArgumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentSlot::Index(index) => write!(f, "{index}"),
            ArgumentSlot::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ArgumentSlot {
    fn from(index: usize) -> Self {
        ArgumentSlot::Index(index)
    }
}

impl From<&str> for ArgumentSlot {
    fn from(name: &str) -> Self {
        ArgumentSlot::Name(name.to_string())
    }
}

impl From<String> for ArgumentSlot {
    fn from(name: String) -> Self {
        ArgumentSlot::Name(name)
    }
}

/// Value assigned to an argument slot of a service definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    /// Inline scalar.
    Value(TagValue),
    /// Reference to a container parameter, resolved at materialization.
    Param(String),
    /// Reference to another service.
    Ref(String),
    /// Ordered list of service references (composite constructor injection).
    RefList(Vec<String>),
}

impl Argument {
    /// The referenced service id, when this argument is a single reference.
    pub fn as_ref_id(&self) -> Option<&str> {
        match self {
            Argument::Ref(id) => Some(id),
            _ => None,
        }
    }
}

//! Shared tag validation assertions.
//!
//! Every pass funnels tag property access through these helpers so
//! misconfiguration always produces the same diagnostics. A missing
//! required property fails the same kind assertion as a wrongly-typed one.

use tagwire_graph::error::{ConfigError, Result};
use tagwire_graph::{ArgumentSlot, ServiceDefinition, TagProperties, TagValue, ValueKind};

/// Fails when `tags` holds more than one instance of `tag`.
pub fn assert_single_tag(tags: &[TagProperties], tag: &str, service: &str) -> Result<()> {
    if tags.len() > 1 {
        return Err(ConfigError::MultipleTags {
            service: service.to_string(),
            tag: tag.to_string(),
        });
    }
    Ok(())
}

/// Template definitions must be abstract so they are never materialized.
pub fn assert_abstract(definition: &ServiceDefinition, service: &str) -> Result<()> {
    if !definition.is_abstract() {
        return Err(ConfigError::ExpectedAbstract {
            service: service.to_string(),
        });
    }
    Ok(())
}

/// Directly usable services must not be abstract.
pub fn assert_not_abstract(definition: &ServiceDefinition, service: &str) -> Result<()> {
    if definition.is_abstract() {
        return Err(ConfigError::ExpectedConcrete {
            service: service.to_string(),
        });
    }
    Ok(())
}

/// Checks that `value` (if present) has one of the accepted kinds.
pub fn assert_kind<'v>(
    value: Option<&'v TagValue>,
    kinds: &[ValueKind],
    property: &str,
    service: &str,
) -> Result<&'v TagValue> {
    match value {
        Some(value) if kinds.contains(&value.kind()) => Ok(value),
        _ => Err(ConfigError::PropertyKindMismatch {
            property: property.to_string(),
            service: service.to_string(),
            expected: kinds.to_vec(),
        }),
    }
}

/// A required string property.
pub fn require_str<'p>(properties: &'p TagProperties, property: &str, service: &str) -> Result<&'p str> {
    match assert_kind(properties.get(property), &[ValueKind::Str], property, service)? {
        TagValue::Str(value) => Ok(value),
        _ => Err(ConfigError::PropertyKindMismatch {
            property: property.to_string(),
            service: service.to_string(),
            expected: vec![ValueKind::Str],
        }),
    }
}

/// An optional string property.
pub fn optional_str<'p>(
    properties: &'p TagProperties,
    property: &str,
    service: &str,
) -> Result<Option<&'p str>> {
    match properties.get(property) {
        None => Ok(None),
        Some(_) => require_str(properties, property, service).map(Some),
    }
}

/// A string property falling back to `default` when absent.
pub fn str_or_default<'p>(
    properties: &'p TagProperties,
    property: &str,
    default: &'p str,
    service: &str,
) -> Result<&'p str> {
    Ok(optional_str(properties, property, service)?.unwrap_or(default))
}

/// An integer property falling back to `default` when absent.
pub fn int_or_default(
    properties: &TagProperties,
    property: &str,
    default: i64,
    service: &str,
) -> Result<i64> {
    match properties.get(property) {
        None => Ok(default),
        Some(value) => {
            assert_kind(Some(value), &[ValueKind::Int], property, service)?;
            Ok(value.as_int().unwrap_or(default))
        }
    }
}

/// A boolean property falling back to `default` when absent.
pub fn bool_or_default(
    properties: &TagProperties,
    property: &str,
    default: bool,
    service: &str,
) -> Result<bool> {
    match properties.get(property) {
        None => Ok(default),
        Some(value) => {
            assert_kind(Some(value), &[ValueKind::Bool], property, service)?;
            Ok(value.as_bool().unwrap_or(default))
        }
    }
}

/// An optional argument slot: integers address positional slots, strings
/// named ones.
pub fn optional_slot(
    properties: &TagProperties,
    property: &str,
    service: &str,
) -> Result<Option<ArgumentSlot>> {
    match properties.get(property) {
        None => Ok(None),
        Some(value) => {
            let value = assert_kind(
                Some(value),
                &[ValueKind::Int, ValueKind::Str],
                property,
                service,
            )?;
            ArgumentSlot::from_value(value).map(Some).ok_or_else(|| {
                ConfigError::PropertyKindMismatch {
                    property: property.to_string(),
                    service: service.to_string(),
                    expected: vec![ValueKind::Int, ValueKind::Str],
                }
            })
        }
    }
}

/// An argument slot defaulting to the first positional slot.
pub fn slot_or_default(
    properties: &TagProperties,
    property: &str,
    service: &str,
) -> Result<ArgumentSlot> {
    Ok(optional_slot(properties, property, service)?.unwrap_or_default())
}

//! Structured tags flattened into scalar properties.
//!
//! Tag properties can only hold scalars, so structured tags ride along as
//! `i<group>_<property>` pairs: group `0`'s `name` property names the
//! first reconstructed tag, its remaining `i0_*` properties become that
//! tag's properties, and so on. Groups are reconstructed in numeric order
//! regardless of declaration order; within a group, properties keep
//! declaration order.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tagwire_graph::error::{ConfigError, Result};
use tagwire_graph::{TagProperties, TagValue};

static GROUP_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^i(?P<group>\d+)_(?P<property>.+)$").expect("valid pattern")
});

/// Decodes flattened properties into tag name to instances, in numeric
/// group order. Properties that do not match the encoding are ignored.
///
/// Every group must carry a `name` property; its remaining properties
/// become the reconstructed tag's properties.
pub fn reconstruct_tags(properties: &TagProperties) -> Result<IndexMap<String, Vec<TagProperties>>> {
    let mut groups: BTreeMap<u64, TagProperties> = BTreeMap::new();
    for (key, value) in properties {
        let Some(captures) = GROUP_PROPERTY.captures(key) else {
            continue;
        };
        let Ok(group) = captures["group"].parse::<u64>() else {
            continue;
        };
        groups
            .entry(group)
            .or_default()
            .insert(captures["property"].to_string(), value.clone());
    }

    let mut tags: IndexMap<String, Vec<TagProperties>> = IndexMap::new();
    for (group, mut group_properties) in groups {
        let name = match group_properties.shift_remove("name") {
            Some(TagValue::Str(name)) => name,
            Some(other) => other.to_string(),
            None => return Err(ConfigError::MissingGroupName { group }),
        };
        tags.entry(name).or_default().push(group_properties);
    }
    Ok(tags)
}

/// Encodes structured tags into flattened scalar properties, the inverse
/// of [`reconstruct_tags`]. Hosts use this when declaring template tags.
pub fn flatten_tags(tags: &IndexMap<String, Vec<TagProperties>>) -> TagProperties {
    let mut flattened = TagProperties::new();
    let mut group = 0u64;
    for (name, instances) in tags {
        for properties in instances {
            flattened.insert(format!("i{group}_name"), TagValue::Str(name.clone()));
            for (key, value) in properties {
                flattened.insert(format!("i{group}_{key}"), value.clone());
            }
            group += 1;
        }
    }
    flattened
}

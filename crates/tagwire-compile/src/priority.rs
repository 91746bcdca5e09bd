//! Priority-ordered collection of tagged collaborators.

use tagwire_graph::error::Result;
use tagwire_graph::{DefinitionGraph, TagProperties};

use crate::asserts::int_or_default;
use crate::index::tagged_services;

/// One member of a tag, with the priority that ordered it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrioritizedTag {
    pub service_id: String,
    pub properties: TagProperties,
    pub priority: i64,
}

/// Collects every instance of `tag` in injection order.
///
/// When `prioritized`, members sort by ascending `priority` (default 0),
/// declaration order breaking ties. Otherwise pure declaration order is
/// kept and the `priority` property, if any, stays visible to argument
/// resolvers untouched.
pub fn collect_by_priority(
    graph: &DefinitionGraph,
    tag: &str,
    prioritized: bool,
) -> Result<Vec<PrioritizedTag>> {
    let mut members = Vec::new();
    for (service_id, instances) in tagged_services(graph, tag) {
        for properties in instances {
            let priority = if prioritized {
                int_or_default(properties, "priority", 0, service_id)?
            } else {
                0
            };
            members.push(PrioritizedTag {
                service_id: service_id.to_string(),
                properties: properties.clone(),
                priority,
            });
        }
    }
    // Stable sort keeps declaration order within one priority.
    members.sort_by_key(|member| member.priority);
    Ok(members)
}

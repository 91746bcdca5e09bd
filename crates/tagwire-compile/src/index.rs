//! Per-invocation tag index.
//!
//! Built fresh at the start of every pass invocation and never cached
//! across invocations: earlier passes in the pipeline may have added or
//! removed tags since the last snapshot.

use indexmap::{IndexMap, IndexSet};
use tagwire_graph::{DefinitionGraph, TagProperties};

/// Snapshot of tag name to declaring service ids, both in declaration
/// order.
#[derive(Debug, Default)]
pub struct TagIndex {
    map: IndexMap<String, IndexSet<String>>,
}

impl TagIndex {
    /// Walks every definition and records which services declare which
    /// tags.
    pub fn build(graph: &DefinitionGraph) -> TagIndex {
        let mut map: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for (id, definition) in graph.definitions() {
            for tag in definition.tags().keys() {
                map.entry(tag.clone()).or_default().insert(id.to_string());
            }
        }
        TagIndex { map }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.map.contains_key(tag)
    }

    /// Services declaring `tag`, in registration order. Empty when the tag
    /// is unknown.
    pub fn services_for(&self, tag: &str) -> impl Iterator<Item = &str> {
        self.map
            .get(tag)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

/// Services declaring `tag` together with their tag instances, in
/// registration order.
pub fn tagged_services<'g>(
    graph: &'g DefinitionGraph,
    tag: &str,
) -> Vec<(&'g str, &'g [TagProperties])> {
    graph
        .definitions()
        .filter(|(_, definition)| definition.has_tag(tag))
        .map(|(id, definition)| (id, definition.tag_instances(tag)))
        .collect()
}

/// Owned snapshot of [`tagged_services`], for passes that mutate the graph
/// while iterating declarations.
pub fn tagged_services_owned(
    graph: &DefinitionGraph,
    tag: &str,
) -> Vec<(String, Vec<TagProperties>)> {
    tagged_services(graph, tag)
        .into_iter()
        .map(|(id, instances)| (id.to_string(), instances.to_vec()))
        .collect()
}

//! The in-memory definition graph passes rewrite.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::definition::ServiceDefinition;
use crate::error::{ConfigError, Result};
use crate::value::TagValue;

/// Ordered store of service definitions, aliases and parameters.
///
/// Registration order is preserved and observable; passes that synthesize
/// definitions append them, and tie-breaking rules throughout the engine
/// fall back to declaration order.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DefinitionGraph {
    definitions: IndexMap<String, ServiceDefinition>,
    aliases: IndexMap<String, String>,
    parameters: IndexMap<String, TagValue>,
}

impl DefinitionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty definition under `id`, replacing any existing one,
    /// and returns it for fluent configuration.
    pub fn register(&mut self, id: impl Into<String>) -> &mut ServiceDefinition {
        let definition = self.definitions.entry(id.into()).or_default();
        *definition = ServiceDefinition::new();
        definition
    }

    /// Inserts a fully built definition, replacing any existing one.
    pub fn set_definition(&mut self, id: impl Into<String>, definition: ServiceDefinition) {
        self.definitions.insert(id.into(), definition);
    }

    /// Whether `id` names a definition or an alias.
    pub fn has(&self, id: &str) -> bool {
        self.definitions.contains_key(id) || self.aliases.contains_key(id)
    }

    /// Looks up a definition, following alias chains.
    pub fn definition(&self, id: &str) -> Result<&ServiceDefinition> {
        let resolved = self.resolve_id(id);
        self.definitions
            .get(&resolved)
            .ok_or_else(|| ConfigError::UnknownService { id: id.to_string() })
    }

    /// Mutable definition lookup, following alias chains.
    pub fn definition_mut(&mut self, id: &str) -> Result<&mut ServiceDefinition> {
        let resolved = self.resolve_id(id);
        self.definitions
            .get_mut(&resolved)
            .ok_or_else(|| ConfigError::UnknownService { id: id.to_string() })
    }

    /// All definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, &ServiceDefinition)> {
        self.definitions
            .iter()
            .map(|(id, definition)| (id.as_str(), definition))
    }

    /// Definition ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Points `alias` at `target`, replacing any previous target.
    pub fn set_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    pub fn has_alias(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    /// One alias hop, without following chains.
    pub fn alias_target(&self, id: &str) -> Option<&str> {
        self.aliases.get(id).map(String::as_str)
    }

    /// Follows alias hops until a non-alias id is reached. Dangling ids come
    /// back unchanged; the definition lookup reports them as unknown.
    pub fn resolve_id(&self, id: &str) -> String {
        let mut current = id;
        let mut hops = 0usize;
        while let Some(target) = self.aliases.get(current) {
            current = target;
            // Alias cycles are host bugs; bail out instead of spinning.
            hops += 1;
            if hops > self.aliases.len() {
                break;
            }
        }
        current.to_string()
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<TagValue>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn parameter(&self, name: &str) -> Result<&TagValue> {
        self.parameters
            .get(name)
            .ok_or_else(|| ConfigError::UnknownParameter {
                name: name.to_string(),
            })
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Direct decorators of `id` in application order: descending priority,
    /// registration order for ties. The first entry is applied first and
    /// therefore ends up innermost.
    pub fn decorators_of(&self, id: &str) -> Vec<&str> {
        let mut decorators: Vec<(&str, i64)> = self
            .definitions
            .iter()
            .filter_map(|(decorator_id, definition)| {
                definition
                    .decoration()
                    .filter(|decoration| decoration.decorated_id == id)
                    .map(|decoration| (decorator_id.as_str(), decoration.priority))
            })
            .collect();
        decorators.sort_by_key(|(_, priority)| std::cmp::Reverse(*priority));
        decorators
            .into_iter()
            .map(|(decorator_id, _)| decorator_id)
            .collect()
    }

    /// The full decoration chain around `id`, outermost first, ending with
    /// `id` itself. This is the order a consumer of `id` traverses at
    /// runtime after decoration is materialized.
    pub fn decoration_chain<'g>(&'g self, id: &'g str) -> Vec<&'g str> {
        let mut chain: Vec<&str> = self.decorators_of(id);
        chain.reverse();
        chain.push(id);
        chain
    }
}

//! Service definitions and their mutation surface.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::argument::{Argument, ArgumentSlot};
use crate::value::TagProperties;

/// One recorded method call on a service, with slot-addressed arguments in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    pub arguments: IndexMap<ArgumentSlot, Argument>,
}

/// Declaration that a service decorates another, with the application
/// priority. Higher priority is applied earlier (ends up innermost).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub decorated_id: String,
    pub priority: i64,
}

/// Build-time description of one service.
///
/// Mutators return `&mut Self` so registration reads as a fluent chain:
///
/// ```
/// use tagwire_graph::DefinitionGraph;
///
/// let mut graph = DefinitionGraph::new();
/// graph
///     .register("app.mailer")
///     .set_class("App\\Mailer")
///     .add_tag("mailer_transport", [("priority", 32.into())]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    class: Option<String>,
    is_abstract: bool,
    parent: Option<String>,
    arguments: IndexMap<ArgumentSlot, Argument>,
    method_calls: Vec<MethodCall>,
    tags: IndexMap<String, Vec<TagProperties>>,
    decorates: Option<Decoration>,
}

impl ServiceDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// A definition inheriting class, arguments and calls from a parent
    /// (abstract) definition at materialization time.
    pub fn child_of(parent: impl Into<String>) -> Self {
        let mut definition = Self::default();
        definition.parent = Some(parent.into());
        definition
    }

    pub fn set_class(&mut self, class: impl Into<String>) -> &mut Self {
        self.class = Some(class.into());
        self
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn set_abstract(&mut self, is_abstract: bool) -> &mut Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn set_parent(&mut self, parent: impl Into<String>) -> &mut Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Binds an argument slot, replacing any previous binding of that slot.
    pub fn set_argument(&mut self, slot: impl Into<ArgumentSlot>, value: Argument) -> &mut Self {
        self.arguments.insert(slot.into(), value);
        self
    }

    pub fn argument(&self, slot: &ArgumentSlot) -> Option<&Argument> {
        self.arguments.get(slot)
    }

    pub fn has_argument(&self, slot: &ArgumentSlot) -> bool {
        self.arguments.contains_key(slot)
    }

    pub fn arguments(&self) -> &IndexMap<ArgumentSlot, Argument> {
        &self.arguments
    }

    /// Records a method call. Calls accumulate; the same method may be
    /// recorded any number of times.
    pub fn add_method_call(
        &mut self,
        method: impl Into<String>,
        arguments: IndexMap<ArgumentSlot, Argument>,
    ) -> &mut Self {
        self.method_calls.push(MethodCall {
            method: method.into(),
            arguments,
        });
        self
    }

    pub fn method_calls(&self) -> &[MethodCall] {
        &self.method_calls
    }

    /// Adds one tag instance under `name`. A tag may be declared multiple
    /// times; instances keep declaration order.
    pub fn add_tag<P>(&mut self, name: impl Into<String>, properties: P) -> &mut Self
    where
        P: IntoIterator<Item = (&'static str, crate::value::TagValue)>,
    {
        let properties: TagProperties = properties
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self.add_tag_properties(name, properties)
    }

    /// Adds one tag instance from an already-built property map.
    pub fn add_tag_properties(
        &mut self,
        name: impl Into<String>,
        properties: TagProperties,
    ) -> &mut Self {
        self.tags.entry(name.into()).or_default().push(properties);
        self
    }

    /// Replaces all tags at once (used when deriving definitions from
    /// templates).
    pub fn set_tags(&mut self, tags: IndexMap<String, Vec<TagProperties>>) -> &mut Self {
        self.tags = tags;
        self
    }

    pub fn remove_tag(&mut self, name: &str) -> &mut Self {
        self.tags.shift_remove(name);
        self
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// All declared instances of `name`, in declaration order. Empty slice
    /// when the tag is absent.
    pub fn tag_instances(&self, name: &str) -> &[TagProperties] {
        self.tags.get(name).map_or(&[], Vec::as_slice)
    }

    /// Tag name to instances, in tag declaration order.
    pub fn tags(&self) -> &IndexMap<String, Vec<TagProperties>> {
        &self.tags
    }

    /// Marks this definition as decorating `decorated_id`.
    pub fn decorate(&mut self, decorated_id: impl Into<String>, priority: i64) -> &mut Self {
        self.decorates = Some(Decoration {
            decorated_id: decorated_id.into(),
            priority,
        });
        self
    }

    pub fn decoration(&self) -> Option<&Decoration> {
        self.decorates.as_ref()
    }
}

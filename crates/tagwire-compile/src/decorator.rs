//! Decorator pass.
//!
//! Abstract template services declare the root tag with a `tag` property
//! naming a decorating tag; consumer services (or single argument slots on
//! them) carrying that decorating tag get wrapped in synthesized decorator
//! definitions derived from the template. Higher priority decorates
//! earlier and ends up innermost; equal priorities apply in tag
//! declaration order.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tagwire_graph::error::{ConfigError, Result};
use tagwire_graph::{Argument, ArgumentSlot, DefinitionGraph, ServiceDefinition, TagProperties};
use tracing::debug;

use crate::CompilerPass;
use crate::asserts::{
    assert_abstract, bool_or_default, int_or_default, optional_slot, require_str, slot_or_default,
};
use crate::capability::ProxyFactory;
use crate::index::TagIndex;
use crate::reconstruct::reconstruct_tags;
use crate::session::{CompileSession, DecoratorState, TagOccurrence, TemplateRegistration};

/// Wraps tagged services and argument slots in decorator chains.
pub struct DecoratorPass {
    tag: String,
    proxy_factory: Option<Box<dyn ProxyFactory>>,
}

/// One consumer-tag occurrence scheduled for decoration.
struct TagReference {
    occurrence: TagOccurrence,
    priority: i64,
    proxy: bool,
    residual: TagProperties,
}

impl DecoratorPass {
    /// A pass driven by the default `decorator` root tag.
    pub fn new() -> Self {
        Self::with_tag("decorator")
    }

    /// A pass driven by a custom root tag.
    pub fn with_tag(tag: impl Into<String>) -> Self {
        DecoratorPass {
            tag: tag.into(),
            proxy_factory: None,
        }
    }

    /// Registers the proxy factory consulted for occurrences with
    /// `proxy: true`. Without one, proxied decoration fails the build.
    pub fn with_proxy_factory(mut self, factory: impl ProxyFactory + 'static) -> Self {
        self.proxy_factory = Some(Box::new(factory));
        self
    }

    fn register_templates(
        &self,
        graph: &DefinitionGraph,
        index: &TagIndex,
        state: &mut DecoratorState,
    ) -> Result<()> {
        for service_id in index.services_for(&self.tag) {
            let definition = graph.definition(service_id)?;
            assert_abstract(definition, service_id)?;
            for properties in definition.tag_instances(&self.tag) {
                let tag_name = require_str(properties, "tag", service_id)?;
                let argument = slot_or_default(properties, "argument", service_id)?;
                match state.templates.get(tag_name) {
                    Some(existing) if existing.service_id != service_id => {
                        return Err(ConfigError::DecoratorTagAlreadyProvided {
                            tag: tag_name.to_string(),
                            owner: existing.service_id.clone(),
                            service: service_id.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        state.templates.insert(
                            tag_name.to_string(),
                            TemplateRegistration {
                                service_id: service_id.to_string(),
                                argument,
                            },
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_references(
        &self,
        graph: &DefinitionGraph,
        state: &DecoratorState,
    ) -> Result<Vec<TagReference>> {
        let mut references = Vec::new();
        let mut seen: HashSet<TagOccurrence> = HashSet::new();
        for (service_id, definition) in graph.definitions() {
            for (tag_name, instances) in definition.tags() {
                if !state.templates.contains_key(tag_name) {
                    continue;
                }
                for properties in instances {
                    let priority = int_or_default(properties, "priority", 0, service_id)?;
                    let argument = optional_slot(properties, "argument", service_id)?;
                    let proxy = bool_or_default(properties, "proxy", false, service_id)?;
                    let occurrence = TagOccurrence {
                        tag: tag_name.clone(),
                        service_id: service_id.to_string(),
                        argument,
                    };
                    if !seen.insert(occurrence.clone()) {
                        return Err(ConfigError::DuplicateDecoratingTag {
                            tag: tag_name.clone(),
                            service: service_id.to_string(),
                            argument: occurrence.argument,
                        });
                    }
                    if state.processed.contains(&occurrence) {
                        debug!(
                            root_tag = %self.tag,
                            tag = %tag_name,
                            service = %service_id,
                            "occurrence already decorated, skipping"
                        );
                        continue;
                    }
                    let mut residual = properties.clone();
                    for reserved in ["tag", "priority", "argument", "proxy"] {
                        residual.shift_remove(reserved);
                    }
                    references.push(TagReference {
                        occurrence,
                        priority,
                        proxy,
                        residual,
                    });
                }
            }
        }
        Ok(references)
    }

    fn apply(
        &self,
        graph: &mut DefinitionGraph,
        state: &mut DecoratorState,
        reference: TagReference,
    ) -> Result<()> {
        let Some(template) = state.templates.get(&reference.occurrence.tag).cloned() else {
            return Ok(());
        };
        let decorated_id = match &reference.occurrence.argument {
            None => reference.occurrence.service_id.clone(),
            Some(slot) => self.alias_for_argument(
                graph,
                &reference.occurrence.service_id,
                &reference.occurrence.tag,
                slot,
            )?,
        };
        self.decorate(graph, &template, &decorated_id, &reference)?;
        state.processed.insert(reference.occurrence);
        Ok(())
    }

    /// Reroutes a reference-holding argument slot through a synthesized
    /// alias so the alias can be decorated like any service. The alias is
    /// created once; later occurrences targeting the same slot under the
    /// same decorating tag reuse it.
    fn alias_for_argument(
        &self,
        graph: &mut DefinitionGraph,
        service_id: &str,
        tag: &str,
        slot: &ArgumentSlot,
    ) -> Result<String> {
        let alias_id = argument_alias_id(service_id, tag, slot);
        if graph.has_alias(&alias_id) {
            return Ok(alias_id);
        }
        let target = match graph.definition(service_id)?.argument(slot) {
            Some(Argument::Ref(target)) => target.clone(),
            _ => {
                return Err(ConfigError::ArgumentNotAReference {
                    argument: slot.clone(),
                    service: service_id.to_string(),
                });
            }
        };
        graph.set_alias(&alias_id, target);
        graph
            .definition_mut(service_id)?
            .set_argument(slot.clone(), Argument::Ref(alias_id.clone()));
        Ok(alias_id)
    }

    fn decorate(
        &self,
        graph: &mut DefinitionGraph,
        template: &TemplateRegistration,
        decorated_id: &str,
        reference: &TagReference,
    ) -> Result<()> {
        let decorating_id = format!("{decorated_id}.{}", reference.occurrence.tag);

        let template_definition = graph.definition(&template.service_id)?;
        let mut tags = template_definition.tags().clone();
        tags.shift_remove(&self.tag);
        let template_class = template_definition.class().map(str::to_string);

        let mut child = ServiceDefinition::child_of(&template.service_id);
        child.set_tags(tags);

        let mut inner_slot = template.argument.clone();
        if reference.proxy {
            let factory =
                self.proxy_factory
                    .as_ref()
                    .ok_or_else(|| ConfigError::ProxyFactoryMissing {
                        service: reference.occurrence.service_id.clone(),
                    })?;
            let decorator_class = template_class.ok_or_else(|| ConfigError::UnknownClass {
                service: template.service_id.clone(),
            })?;
            let decorated_class = graph
                .definition(decorated_id)?
                .class()
                .map(str::to_string)
                .ok_or_else(|| ConfigError::UnknownClass {
                    service: decorated_id.to_string(),
                })?;
            let proxy_class = factory.combine(&decorator_class, &decorated_class)?;
            inner_slot = factory.resolve_inner_slot(&proxy_class, &template.argument)?;
            child.set_class(proxy_class);
        }

        child.set_argument(inner_slot, Argument::Ref(format!("{decorating_id}.inner")));
        child.decorate(decorated_id, reference.priority);

        for (name, instances) in reconstruct_tags(&reference.residual)? {
            for properties in instances {
                child.add_tag_properties(name.as_str(), properties);
            }
        }

        debug!(
            root_tag = %self.tag,
            decorator = %decorating_id,
            decorated = %decorated_id,
            priority = reference.priority,
            "decorating service"
        );
        graph.set_definition(decorating_id, child);
        Ok(())
    }
}

impl Default for DecoratorPass {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerPass for DecoratorPass {
    fn process(&self, graph: &mut DefinitionGraph, session: &mut CompileSession) -> Result<()> {
        let index = TagIndex::build(graph);
        if !index.contains(&self.tag) {
            return Ok(());
        }
        let state = session.decorator_state(&self.tag);
        self.register_templates(graph, &index, state)?;
        let references = self.collect_references(graph, state)?;
        for reference in references {
            self.apply(graph, state, reference)?;
        }
        Ok(())
    }
}

/// Identifier of the alias synthesized for a decorated argument slot.
///
/// The hash covers both the decorating tag and the slot, so two different
/// decorating tags aimed at the same slot produce distinct aliases and
/// independent decoration chains.
pub fn argument_alias_id(service_id: &str, tag: &str, slot: &ArgumentSlot) -> String {
    let digest = Sha256::digest(format!("{tag}:{slot}").as_bytes());
    let hash = hex::encode(digest);
    format!("{service_id}.{}", &hash[..40])
}

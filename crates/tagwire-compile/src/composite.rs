//! Dynamic composite pass.
//!
//! A composite service declares the root tag with a `tag` property naming
//! its member tag. Every service carrying the member tag is collected in
//! ascending priority order and injected either as a reference list on a
//! constructor slot or as one recorded method call per member.

use std::collections::HashMap;

use tagwire_graph::error::{ConfigError, Result};
use tagwire_graph::{Argument, DefinitionGraph, TagProperties};
use tracing::debug;

use crate::asserts::{bool_or_default, require_str, slot_or_default, str_or_default};
use crate::capability::ArgumentResolver;
use crate::index::tagged_services_owned;
use crate::priority::collect_by_priority;
use crate::session::{CompileSession, CompositeState};
use crate::CompilerPass;

/// Sentinel method name addressing the constructor instead of a recorded
/// method call.
pub const CONSTRUCTOR: &str = "__construct";

/// Injects priority-ordered member collections into composite services.
pub struct DynamicCompositePass {
    tag: String,
    resolvers: HashMap<String, Box<dyn ArgumentResolver>>,
}

impl DynamicCompositePass {
    /// A pass driven by the default `dynamic_composite` root tag.
    pub fn new() -> Self {
        Self::with_tag("dynamic_composite")
    }

    /// A pass driven by a custom root tag. Multiple instances with
    /// distinct tags can run in one pipeline without sharing state.
    pub fn with_tag(tag: impl Into<String>) -> Self {
        DynamicCompositePass {
            tag: tag.into(),
            resolvers: HashMap::new(),
        }
    }

    /// Registers an argument resolver consulted for members of
    /// `member_tag` during method injection.
    pub fn with_resolver(
        mut self,
        member_tag: impl Into<String>,
        resolver: impl ArgumentResolver + 'static,
    ) -> Self {
        self.resolvers.insert(member_tag.into(), Box::new(resolver));
        self
    }

    fn link_members(
        &self,
        graph: &mut DefinitionGraph,
        state: &mut CompositeState,
        service_id: &str,
        properties: &TagProperties,
    ) -> Result<()> {
        let member_tag = require_str(properties, "tag", service_id)?.to_string();
        let method = str_or_default(properties, "method", CONSTRUCTOR, service_id)?.to_string();
        let slot = slot_or_default(properties, "argument", service_id)?;
        let prioritized = bool_or_default(properties, "prioritized", true, service_id)?;

        // One composite owns a member tag for the whole compilation.
        match state.owners.get(&member_tag) {
            Some(owner) if owner != service_id => {
                return Err(ConfigError::MemberTagAlreadyProvided {
                    tag: member_tag,
                    owner: owner.clone(),
                    service: service_id.to_string(),
                });
            }
            _ => {
                state
                    .owners
                    .insert(member_tag.clone(), service_id.to_string());
            }
        }

        if state.resolved.contains(&member_tag) {
            debug!(
                root_tag = %self.tag,
                member_tag = %member_tag,
                service = %service_id,
                "membership already captured, skipping"
            );
            return Ok(());
        }

        let members = collect_by_priority(graph, &member_tag, prioritized)?;
        debug!(
            root_tag = %self.tag,
            member_tag = %member_tag,
            service = %service_id,
            members = members.len(),
            "linking composite members"
        );

        if method == CONSTRUCTOR {
            let references = members
                .iter()
                .map(|member| member.service_id.clone())
                .collect();
            graph
                .definition_mut(service_id)?
                .set_argument(slot, Argument::RefList(references));
        } else {
            let resolver = self.resolvers.get(&member_tag);
            for member in &members {
                let mut arguments = match resolver {
                    Some(resolver) => {
                        resolver.resolve_for(graph, service_id, &member.properties)?
                    }
                    None => indexmap::IndexMap::new(),
                };
                if arguments.contains_key(&slot) {
                    return Err(ConfigError::ResolverArgumentCollision {
                        argument: slot.clone(),
                    });
                }
                arguments.insert(slot.clone(), Argument::Ref(member.service_id.clone()));
                graph
                    .definition_mut(service_id)?
                    .add_method_call(&method, arguments);
            }
            if let Some(resolver) = resolver {
                resolver.finish();
            }
        }

        state.resolved.insert(member_tag);
        Ok(())
    }
}

impl Default for DynamicCompositePass {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerPass for DynamicCompositePass {
    fn process(&self, graph: &mut DefinitionGraph, session: &mut CompileSession) -> Result<()> {
        let declarations = tagged_services_owned(graph, &self.tag);
        if declarations.is_empty() {
            return Ok(());
        }
        let state = session.composite_state(&self.tag);
        for (service_id, instances) in &declarations {
            for properties in instances {
                self.link_members(graph, state, service_id, properties)?;
            }
        }
        Ok(())
    }
}

//! Service linker pass.
//!
//! Binds one argument slot per linker tag. Direct linking looks the
//! reference up in a provider registry (services tagged with the provider
//! tag, each exposing a unique `provides` key). Indirect linking walks the
//! services carrying a resolver tag and binds the slot on each of them
//! from exactly one of three sources: a provider key, a container
//! parameter, or a plain service reference.
//!
//! Must run after parameter resolution.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tagwire_graph::error::{ConfigError, Result};
use tagwire_graph::{Argument, ArgumentSlot, DefinitionGraph, TagProperties};
use tracing::debug;

use crate::CompilerPass;
use crate::asserts::{
    assert_not_abstract, assert_single_tag, optional_str, require_str, slot_or_default,
};
use crate::index::{tagged_services, tagged_services_owned};
use crate::session::{CompileSession, LinkerState};

/// Provider tag to (provides key to provider service id). Rebuilt every
/// invocation; provider declarations may change between passes.
type ProviderCache = HashMap<String, IndexMap<String, String>>;

/// Resolves linker-tagged argument slots from providers, parameters or
/// references.
pub struct ServiceLinkerPass {
    tag: String,
}

impl ServiceLinkerPass {
    /// A pass driven by the default `linker` root tag.
    pub fn new() -> Self {
        Self::with_tag("linker")
    }

    /// A pass driven by a custom root tag.
    pub fn with_tag(tag: impl Into<String>) -> Self {
        ServiceLinkerPass { tag: tag.into() }
    }

    fn link_service(
        &self,
        graph: &mut DefinitionGraph,
        state: &mut LinkerState,
        providers: &mut ProviderCache,
        service_id: &str,
        instances: &[TagProperties],
    ) -> Result<()> {
        // Slot collisions are checked per invocation: even an
        // already-linked slot may not be redeclared twice in one pass.
        let mut declared_slots: HashSet<ArgumentSlot> = HashSet::new();

        for properties in instances {
            let slot = slot_or_default(properties, "argument", service_id)?;
            if !declared_slots.insert(slot.clone()) {
                return Err(ConfigError::ArgumentAlreadyDefined {
                    argument: slot,
                    service: service_id.to_string(),
                });
            }

            let marker = (service_id.to_string(), slot.clone());
            if state.linked.contains(&marker) {
                debug!(
                    root_tag = %self.tag,
                    service = %service_id,
                    slot = %slot,
                    "slot already linked, skipping"
                );
                continue;
            }
            state.linked.insert(marker);

            if properties.contains_key("provider_tag") {
                let provider_tag = require_str(properties, "provider_tag", service_id)?;
                ensure_providers(graph, providers, provider_tag)?;
                let provider = require_str(properties, "provider", service_id)?;
                let provider_id = providers
                    .get(provider_tag)
                    .and_then(|registry| registry.get(provider))
                    .cloned();
                let Some(provider_id) = provider_id else {
                    return Err(ConfigError::NoSuchProvider {
                        provider: provider.to_string(),
                        tag: provider_tag.to_string(),
                    });
                };
                graph
                    .definition_mut(service_id)?
                    .set_argument(slot, Argument::Ref(provider_id));
                continue;
            }

            let resolver_tag = require_str(properties, "argument_resolver_tag", service_id)?;
            self.link_indirect(graph, providers, &slot, &resolver_tag.to_string())?;
        }
        Ok(())
    }

    /// Binds `slot` on every service carrying `resolver_tag`, each picking
    /// its own source strategy.
    fn link_indirect(
        &self,
        graph: &mut DefinitionGraph,
        providers: &mut ProviderCache,
        slot: &ArgumentSlot,
        resolver_tag: &str,
    ) -> Result<()> {
        let resolvers = tagged_services_owned(graph, resolver_tag);
        for (resolver_id, instances) in &resolvers {
            let definition = graph.definition(resolver_id)?;
            assert_not_abstract(definition, resolver_id)?;
            assert_single_tag(instances, resolver_tag, resolver_id)?;
            self.link_by_strategy(graph, providers, slot, resolver_tag, resolver_id, &instances[0])?;
        }
        Ok(())
    }

    fn link_by_strategy(
        &self,
        graph: &mut DefinitionGraph,
        providers: &mut ProviderCache,
        slot: &ArgumentSlot,
        resolver_tag: &str,
        service_id: &str,
        properties: &TagProperties,
    ) -> Result<()> {
        let provider = optional_str(properties, "provider", service_id)?;
        let param = optional_str(properties, "param", service_id)?;
        let service = optional_str(properties, "service", service_id)?;

        let sources = usize::from(provider.is_some())
            + usize::from(param.is_some())
            + usize::from(service.is_some());
        if sources != 1 {
            return Err(ConfigError::AmbiguousLinkSource {
                service: service_id.to_string(),
                tag: resolver_tag.to_string(),
            });
        }

        if let Some(provider) = provider {
            let provider_tag = require_str(properties, "provider_tag", service_id)?;
            ensure_providers(graph, providers, provider_tag)?;
            let provider_id = providers
                .get(provider_tag)
                .and_then(|registry| registry.get(provider))
                .cloned();
            let Some(provider_id) = provider_id else {
                return Err(ConfigError::NoSuchProvider {
                    provider: provider.to_string(),
                    tag: provider_tag.to_string(),
                });
            };
            graph
                .definition_mut(service_id)?
                .set_argument(slot.clone(), Argument::Ref(provider_id));
        } else if let Some(param) = param {
            let value = graph.parameter(param)?.clone();
            graph
                .definition_mut(service_id)?
                .set_argument(slot.clone(), Argument::Value(value));
        } else if let Some(service) = service {
            let reference = Argument::Ref(service.to_string());
            graph
                .definition_mut(service_id)?
                .set_argument(slot.clone(), reference);
        }
        Ok(())
    }
}

impl Default for ServiceLinkerPass {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerPass for ServiceLinkerPass {
    fn process(&self, graph: &mut DefinitionGraph, session: &mut CompileSession) -> Result<()> {
        let declarations = tagged_services_owned(graph, &self.tag);
        if declarations.is_empty() {
            return Ok(());
        }
        let state = session.linker_state(&self.tag);
        let mut providers = ProviderCache::new();
        for (service_id, instances) in &declarations {
            self.link_service(graph, state, &mut providers, service_id, instances)?;
        }
        Ok(())
    }
}

/// Discovers the provider registry for `provider_tag` once per
/// invocation: every tagged service exposes a unique `provides` key.
fn ensure_providers(
    graph: &DefinitionGraph,
    providers: &mut ProviderCache,
    provider_tag: &str,
) -> Result<()> {
    if providers.contains_key(provider_tag) {
        return Ok(());
    }
    let declarations = tagged_services(graph, provider_tag);
    if declarations.is_empty() {
        return Err(ConfigError::NoProvidersFound {
            tag: provider_tag.to_string(),
        });
    }
    let mut registry: IndexMap<String, String> = IndexMap::new();
    for (service_id, instances) in declarations {
        for properties in instances {
            let key = require_str(properties, "provides", service_id)?;
            if let Some(owner) = registry.get(key) {
                return Err(ConfigError::DuplicateProvider {
                    provider: key.to_string(),
                    tag: provider_tag.to_string(),
                    owner: owner.clone(),
                });
            }
            registry.insert(key.to_string(), service_id.to_string());
        }
    }
    providers.insert(provider_tag.to_string(), registry);
    Ok(())
}

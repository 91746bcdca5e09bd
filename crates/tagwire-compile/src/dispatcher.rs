//! Event dispatcher wiring pass.
//!
//! A dispatcher service declares the root tag with `listener_tag` and
//! `subscriber_tag` options. The pass validates the claims (both present,
//! distinct, and not used by any other dispatcher) and delegates the
//! actual wiring of listeners and subscribers to the host's
//! [`ListenerRegistrar`], once per listener tag.

use std::collections::HashMap;

use tagwire_graph::error::{ConfigError, Result};
use tagwire_graph::{DefinitionGraph, TagProperties, TagValue};
use tracing::debug;

use crate::CompilerPass;
use crate::capability::ListenerRegistrar;
use crate::index::tagged_services_owned;
use crate::session::CompileSession;

/// Registers services as event dispatchers and wires their listeners.
pub struct EventDispatcherPass {
    tag: String,
    registrar: Box<dyn ListenerRegistrar>,
}

impl EventDispatcherPass {
    /// A pass driven by the default `event_dispatcher` root tag.
    pub fn new(registrar: impl ListenerRegistrar + 'static) -> Self {
        Self::with_tag("event_dispatcher", registrar)
    }

    /// A pass driven by a custom root tag.
    pub fn with_tag(tag: impl Into<String>, registrar: impl ListenerRegistrar + 'static) -> Self {
        EventDispatcherPass {
            tag: tag.into(),
            registrar: Box::new(registrar),
        }
    }

    fn string_option(
        properties: &TagProperties,
        option: &str,
        service_id: &str,
    ) -> Result<String> {
        match properties.get(option) {
            Some(TagValue::Str(value)) => Ok(value.clone()),
            _ => Err(ConfigError::InvalidTagOption {
                option: option.to_string(),
                service: service_id.to_string(),
            }),
        }
    }

    fn dispatcher_from(
        properties: &TagProperties,
        service_id: &str,
    ) -> Result<(String, String)> {
        let listener_tag = Self::string_option(properties, "listener_tag", service_id)?;
        let subscriber_tag = Self::string_option(properties, "subscriber_tag", service_id)?;
        if listener_tag == subscriber_tag {
            return Err(ConfigError::ListenerTagsEqual {
                service: service_id.to_string(),
            });
        }
        Ok((listener_tag, subscriber_tag))
    }
}

impl CompilerPass for EventDispatcherPass {
    fn process(&self, graph: &mut DefinitionGraph, session: &mut CompileSession) -> Result<()> {
        let declarations = tagged_services_owned(graph, &self.tag);
        if declarations.is_empty() {
            return Ok(());
        }
        let state = session.dispatcher_state(&self.tag);

        let mut dispatchers = Vec::new();
        // Claims within one invocation are strictly unique; across
        // invocations a dispatcher may re-claim its own tags.
        let mut claimed_now: HashMap<String, String> = HashMap::new();
        for (service_id, instances) in &declarations {
            for properties in instances {
                let (listener_tag, subscriber_tag) =
                    Self::dispatcher_from(properties, service_id)?;
                for claim in [&listener_tag, &subscriber_tag] {
                    if let Some(owner) = claimed_now.get(claim) {
                        return Err(ConfigError::DispatcherTagAlreadyUsed {
                            tag: claim.clone(),
                            owner: owner.clone(),
                        });
                    }
                    if let Some(owner) = state.claimed.get(claim) {
                        if owner != service_id {
                            return Err(ConfigError::DispatcherTagAlreadyUsed {
                                tag: claim.clone(),
                                owner: owner.clone(),
                            });
                        }
                    }
                    claimed_now.insert(claim.clone(), service_id.clone());
                }
                dispatchers.push((service_id.clone(), listener_tag, subscriber_tag));
            }
        }
        state.claimed.extend(claimed_now);

        for (service_id, listener_tag, subscriber_tag) in dispatchers {
            if state.registered.contains(&listener_tag) {
                debug!(
                    root_tag = %self.tag,
                    dispatcher = %service_id,
                    listener_tag = %listener_tag,
                    "listeners already registered, skipping"
                );
                continue;
            }
            self.registrar
                .register_listeners(graph, &service_id, &listener_tag, &subscriber_tag)?;
            state.registered.insert(listener_tag);
        }
        Ok(())
    }
}

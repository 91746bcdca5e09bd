//! Host capability traits.
//!
//! The passes never reflect over host classes or frameworks. Anything that
//! needs knowledge only the host has - extra method arguments, proxy class
//! synthesis, listener wiring - is injected as a trait object when the
//! pass is constructed.

use indexmap::IndexMap;
use tagwire_graph::error::Result;
use tagwire_graph::{Argument, ArgumentSlot, DefinitionGraph, TagProperties};

/// Computes extra arguments for composite method injection, one call per
/// member.
///
/// Returned slots must not collide with the slot the composite pass
/// reserves for the member reference; a collision fails the build.
pub trait ArgumentResolver {
    /// Extra slot-addressed arguments for the method call that injects the
    /// member carrying `properties` into `service_id`.
    fn resolve_for(
        &self,
        graph: &DefinitionGraph,
        service_id: &str,
        properties: &TagProperties,
    ) -> Result<IndexMap<ArgumentSlot, Argument>>;

    /// Called once after every member of a tag has been resolved, so
    /// stateful resolvers can release per-tag bookkeeping.
    fn finish(&self) {}
}

/// Synthesizes concrete classes for proxied decoration.
pub trait ProxyFactory {
    /// A class implementing the decorated service's surface by combining
    /// `decorator_class` around `decorated_class`.
    fn combine(&self, decorator_class: &str, decorated_class: &str) -> Result<String>;

    /// The constructor slot of `proxy_class` that receives the decorated
    /// (inner) service, given the slot the template declared.
    fn resolve_inner_slot(&self, proxy_class: &str, declared: &ArgumentSlot)
    -> Result<ArgumentSlot>;
}

/// The host framework's listener-registration routine.
///
/// The dispatcher pass validates tag claims; the actual wiring of listener
/// and subscriber tags onto the dispatcher definition is framework
/// specific and delegated here.
pub trait ListenerRegistrar {
    fn register_listeners(
        &self,
        graph: &mut DefinitionGraph,
        dispatcher_id: &str,
        listener_tag: &str,
        subscriber_tag: &str,
    ) -> Result<()>;
}

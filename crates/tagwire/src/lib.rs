//! # tagwire
//!
//! A tag-driven compiler-pass engine for dependency-injection definition
//! graphs. Hosts register service definitions carrying scalar-property
//! tags; a pipeline of passes rewrites the graph before the container is
//! materialized:
//!
//! - **Dynamic composites** - inject priority-ordered collections of
//!   tagged collaborators into a constructor slot or as repeated method
//!   calls.
//! - **Decorators** - wrap services (or single argument slots) in
//!   decorator chains derived from abstract templates.
//! - **Service linkers** - bind argument slots from provider registries,
//!   parameters or plain references.
//! - **Event dispatchers** - validate listener/subscriber tag claims and
//!   delegate wiring to the host framework.
//!
//! ## Example
//!
//! ```
//! use tagwire::{Compiler, DefinitionGraph, DynamicCompositePass};
//!
//! let mut graph = DefinitionGraph::new();
//! graph
//!     .register("app.handler_chain")
//!     .add_tag("dynamic_composite", [("tag", "app.handler".into())]);
//! graph
//!     .register("app.auth_handler")
//!     .add_tag("app.handler", [("priority", 32.into())]);
//! graph
//!     .register("app.log_handler")
//!     .add_tag("app.handler", [("priority", 64.into())]);
//!
//! let compiler = Compiler::new().with_pass(DynamicCompositePass::new());
//! compiler.compile(&mut graph)?;
//! # Ok::<(), tagwire::ConfigError>(())
//! ```

/// Graph layer - definitions, tags, arguments, aliases and parameters.
///
/// Re-exports from the graph crate for convenience.
pub mod graph {
    pub use tagwire_graph::*;
}

/// Compile layer - the pass pipeline and the four built-in passes.
///
/// Re-exports from the compile crate for convenience.
pub mod compile {
    pub use tagwire_compile::*;
}

// Re-export the common working set at the crate root.
pub use graph::{
    Argument, ArgumentSlot, ConfigError, DefinitionGraph, Result, ServiceDefinition,
    TagProperties, TagValue,
};

pub use compile::{
    ArgumentResolver, CompileSession, Compiler, CompilerPass, DecoratorPass,
    DynamicCompositePass, EventDispatcherPass, ListenerRegistrar, ProxyFactory,
    ServiceLinkerPass,
};

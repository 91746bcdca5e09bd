//! # tagwire-compile
//!
//! Tag-driven compiler passes over a [`DefinitionGraph`]: dynamic
//! composites, decorator chains, argument linking and event-dispatcher
//! wiring. Hosts configure the passes they need, assemble them into a
//! [`Compiler`], and run the pipeline before materializing the container.
//!
//! Every pass is idempotent: the [`CompileSession`] threaded through each
//! invocation records what was already done, so re-running a pipeline over
//! an already-compiled graph is a no-op.

pub mod asserts;
pub mod capability;
pub mod composite;
pub mod decorator;
pub mod dispatcher;
pub mod index;
pub mod linker;
pub mod priority;
pub mod reconstruct;
pub mod session;

use tagwire_graph::DefinitionGraph;
use tagwire_graph::error::Result;
use tracing::debug;

pub use capability::{ArgumentResolver, ListenerRegistrar, ProxyFactory};
pub use composite::{CONSTRUCTOR, DynamicCompositePass};
pub use decorator::{DecoratorPass, argument_alias_id};
pub use dispatcher::EventDispatcherPass;
pub use index::TagIndex;
pub use linker::ServiceLinkerPass;
pub use session::CompileSession;

/// A build-time transformation of the definition graph.
///
/// Passes read tag declarations and rewrite definitions; they never
/// instantiate services. A pass must tolerate being invoked multiple times
/// against the same session without duplicating its work.
pub trait CompilerPass {
    fn process(&self, graph: &mut DefinitionGraph, session: &mut CompileSession) -> Result<()>;
}

/// Ordered pass pipeline.
///
/// Passes run in registration order and share one session; the first
/// error aborts compilation.
#[derive(Default)]
pub struct Compiler {
    passes: Vec<Box<dyn CompilerPass>>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass, builder style.
    #[must_use]
    pub fn with_pass(mut self, pass: impl CompilerPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends a pass to an existing pipeline.
    pub fn add_pass(&mut self, pass: impl CompilerPass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Runs the pipeline with a fresh session.
    pub fn compile(&self, graph: &mut DefinitionGraph) -> Result<()> {
        let mut session = CompileSession::new();
        self.compile_with(graph, &mut session)
    }

    /// Runs the pipeline against an existing session, e.g. when the host
    /// interleaves its own passes between tagwire invocations.
    pub fn compile_with(
        &self,
        graph: &mut DefinitionGraph,
        session: &mut CompileSession,
    ) -> Result<()> {
        debug!(passes = self.passes.len(), "running compiler pipeline");
        for pass in &self.passes {
            pass.process(graph, session)?;
        }
        Ok(())
    }
}

//! Explicit cross-invocation compilation state.
//!
//! Passes are idempotent: re-running a pipeline over an already-compiled
//! graph must not duplicate work. The markers that make this possible live
//! here, keyed by each pass's root tag so independently configured passes
//! never observe each other's state. The session is created by the host
//! (or the [`Compiler`](crate::Compiler)) and threaded through every
//! invocation; it is never stored in the graph itself.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tagwire_graph::ArgumentSlot;

/// State shared across pass invocations within one compilation.
#[derive(Debug, Default)]
pub struct CompileSession {
    decorators: HashMap<String, DecoratorState>,
    composites: HashMap<String, CompositeState>,
    linkers: HashMap<String, LinkerState>,
    dispatchers: HashMap<String, DispatcherState>,
}

impl CompileSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn decorator_state(&mut self, root_tag: &str) -> &mut DecoratorState {
        self.decorators.entry(root_tag.to_string()).or_default()
    }

    pub(crate) fn composite_state(&mut self, root_tag: &str) -> &mut CompositeState {
        self.composites.entry(root_tag.to_string()).or_default()
    }

    pub(crate) fn linker_state(&mut self, root_tag: &str) -> &mut LinkerState {
        self.linkers.entry(root_tag.to_string()).or_default()
    }

    pub(crate) fn dispatcher_state(&mut self, root_tag: &str) -> &mut DispatcherState {
        self.dispatchers.entry(root_tag.to_string()).or_default()
    }
}

/// Identity of one consumer-tag occurrence.
///
/// Priority and residual properties are deliberately not part of the
/// identity: re-declaring the same occurrence with a different priority is
/// still the same occurrence and is skipped on re-invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TagOccurrence {
    pub tag: String,
    pub service_id: String,
    pub argument: Option<ArgumentSlot>,
}

/// A registered decorator template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TemplateRegistration {
    pub service_id: String,
    pub argument: ArgumentSlot,
}

#[derive(Debug, Default)]
pub(crate) struct DecoratorState {
    /// Decorating tag name to template, in registration order.
    pub templates: IndexMap<String, TemplateRegistration>,
    /// Occurrences already decorated in an earlier invocation.
    pub processed: HashSet<TagOccurrence>,
}

#[derive(Debug, Default)]
pub(crate) struct CompositeState {
    /// Member tag name to the composite service that owns it.
    pub owners: HashMap<String, String>,
    /// Member tags whose membership was already captured. Frozen: later
    /// invocations never recompute them.
    pub resolved: HashSet<String>,
}

#[derive(Debug, Default)]
pub(crate) struct LinkerState {
    /// (consumer service, slot) pairs already linked.
    pub linked: HashSet<(String, ArgumentSlot)>,
}

#[derive(Debug, Default)]
pub(crate) struct DispatcherState {
    /// Listener/subscriber tag to the dispatcher service that claimed it.
    pub claimed: HashMap<String, String>,
    /// Listener tags whose registration already ran.
    pub registered: HashSet<String>,
}

//! # tagwire-graph
//!
//! The definition graph a dependency-injection host exposes to the tagwire
//! compiler passes: service definitions with scalar-property tags, aliases,
//! parameters, and the decoration bookkeeping the passes rewrite.
//!
//! This crate is pure data. The passes themselves live in
//! `tagwire-compile`; hosts usually depend on the `tagwire` facade.

pub mod argument;
pub mod definition;
pub mod error;
pub mod graph;
pub mod value;

pub use argument::{Argument, ArgumentSlot};
pub use definition::{Decoration, MethodCall, ServiceDefinition};
pub use error::{ConfigError, Result};
pub use graph::DefinitionGraph;
pub use value::{TagProperties, TagValue, ValueKind};

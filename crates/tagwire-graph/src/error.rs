//! Error handling for graph mutation and compilation.
//!
//! Every failure in this engine is a host configuration mistake. Passes
//! never degrade or skip a misconfigured service; the first error aborts
//! the build and surfaces as a [`ConfigError`].

use thiserror::Error;

use crate::argument::ArgumentSlot;
use crate::value::ValueKind;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Fatal configuration error raised while building or compiling the graph.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A service id was referenced but never registered.
    #[error("unknown service {id}")]
    UnknownService { id: String },

    /// A container parameter was referenced but never set.
    #[error("unknown parameter {name}")]
    UnknownParameter { name: String },

    /// A tag that must appear at most once was declared multiple times.
    #[error("service {service} has multiple {tag} tags which is not allowed")]
    MultipleTags { service: String, tag: String },

    /// A template service must be abstract so it is never materialized.
    #[error("expected service {service} to be defined as abstract")]
    ExpectedAbstract { service: String },

    /// A directly usable service must not be abstract.
    #[error("expected service {service} to be defined as non-abstract")]
    ExpectedConcrete { service: String },

    /// A tag property had the wrong scalar kind (or was missing).
    #[error(
        "expected {property} to be any of [{}] in service {service}",
        kind_list(.expected)
    )]
    PropertyKindMismatch {
        property: String,
        service: String,
        expected: Vec<ValueKind>,
    },

    /// A flattened tag group carried no `name` property.
    #[error("no tag name provided for group {group}")]
    MissingGroupName { group: u64 },

    /// Two composite services both claimed ownership of a member tag.
    #[error("tag {tag} already provided by service {owner} (issue found on service {service})")]
    MemberTagAlreadyProvided {
        tag: String,
        owner: String,
        service: String,
    },

    /// Two decorator templates both registered the same decorating tag.
    #[error("tag {tag} already provided by {owner} (issue found on service {service})")]
    DecoratorTagAlreadyProvided {
        tag: String,
        owner: String,
        service: String,
    },

    /// A consumer declared the same decorating tag twice for one target.
    #[error(
        "only one tag {tag} allowed on service {service}{}",
        slot_suffix(.argument)
    )]
    DuplicateDecoratingTag {
        tag: String,
        service: String,
        argument: Option<ArgumentSlot>,
    },

    /// Argument decoration requires the slot to hold an explicit reference.
    #[error(
        "argument {argument} must be explicitly defined to reference some service (issue on service {service})"
    )]
    ArgumentNotAReference {
        argument: ArgumentSlot,
        service: String,
    },

    /// Two linker tags on one service addressed the same slot.
    #[error("argument {argument} already defined on service {service}")]
    ArgumentAlreadyDefined {
        argument: ArgumentSlot,
        service: String,
    },

    /// A resolver produced an argument on the slot reserved for the member
    /// reference.
    #[error("argument {argument} already defined by the resolver")]
    ResolverArgumentCollision { argument: ArgumentSlot },

    /// A provider tag was requested but no service declares it.
    #[error("no providers with tag {tag} found")]
    NoProvidersFound { tag: String },

    /// No provider under the tag exposes the requested key.
    #[error("no service provides {provider} (tag {tag})")]
    NoSuchProvider { provider: String, tag: String },

    /// Two providers under one tag exposed the same key.
    #[error("another service ({owner}) already provides {provider} (tag {tag})")]
    DuplicateProvider {
        provider: String,
        tag: String,
        owner: String,
    },

    /// An indirect linker resolver must pick exactly one source strategy.
    #[error(
        "expected only one of [provider, param, service] to be of type string on service {service} for tag {tag}"
    )]
    AmbiguousLinkSource { service: String, tag: String },

    /// A dispatcher tag is missing a required string option.
    #[error("invalid/missing tag option \"{option}\" on service \"{service}\"")]
    InvalidTagOption { option: String, service: String },

    /// A dispatcher declared identical listener and subscriber tags.
    #[error("values for listener_tag and subscriber_tag are the same on service {service}")]
    ListenerTagsEqual { service: String },

    /// A listener or subscriber tag is already claimed by another dispatcher.
    #[error("tag {tag} already used by {owner}")]
    DispatcherTagAlreadyUsed { tag: String, owner: String },

    /// Proxied decoration was requested but no proxy factory is registered.
    #[error("no proxy factory registered (proxied decoration requested on service {service})")]
    ProxyFactoryMissing { service: String },

    /// Proxied decoration needs concrete classes on both sides.
    #[error("cannot determine class of service {service}")]
    UnknownClass { service: String },

    /// The proxy factory rejected the synthesized class combination.
    #[error("proxy synthesis failed for {decorator} over {decorated}: {reason}")]
    ProxySynthesis {
        decorator: String,
        decorated: String,
        reason: String,
    },

    /// The host's listener registration routine failed.
    #[error("listener registration failed for dispatcher {dispatcher}: {reason}")]
    ListenerRegistration { dispatcher: String, reason: String },
}

fn kind_list(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn slot_suffix(argument: &Option<ArgumentSlot>) -> String {
    match argument {
        Some(slot) => format!(" and argument {slot}"),
        None => String::new(),
    }
}

//! Tests for the decorator pass.


use tagwire_compile::{
    CompileSession, CompilerPass, DecoratorPass, ProxyFactory, argument_alias_id,
};
use tagwire_graph::error::Result;
use tagwire_graph::{Argument, ArgumentSlot, DefinitionGraph, TagValue};
use test_utils::{
    assert_decorator_exists_for, assert_decorator_exists_for_argument, assert_key_before,
    reference,
};

/// Factory that records the combination in the synthesized class name and
/// shifts the inner slot by one, so both are observable.
struct NamingProxyFactory;

impl ProxyFactory for NamingProxyFactory {
    fn combine(&self, decorator_class: &str, decorated_class: &str) -> Result<String> {
        Ok(format!("Proxy<{decorator_class}, {decorated_class}>"))
    }

    fn resolve_inner_slot(
        &self,
        _proxy_class: &str,
        declared: &ArgumentSlot,
    ) -> Result<ArgumentSlot> {
        match declared {
            ArgumentSlot::Index(index) => Ok(ArgumentSlot::Index(index + 1)),
            ArgumentSlot::Name(name) => Ok(ArgumentSlot::Name(name.clone())),
        }
    }
}

fn run(pass: &DecoratorPass, graph: &mut DefinitionGraph) {
    let mut session = CompileSession::new();
    pass.process(graph, &mut session).unwrap();
}

#[test]
fn service_is_decorated() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph.register("bar").add_tag("foo", []);

    run(&DecoratorPass::new(), &mut graph);

    assert_decorator_exists_for(&graph, "bar", "foo", "decorator.tpl", &ArgumentSlot::Index(0), 0);
}

#[test]
fn template_argument_slot_is_respected() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into()), ("argument", "$inner".into())]);
    graph.register("bar").add_tag("foo", []);

    run(&DecoratorPass::new(), &mut graph);

    assert_decorator_exists_for(
        &graph,
        "bar",
        "foo",
        "decorator.tpl",
        &ArgumentSlot::Name("$inner".to_string()),
        0,
    );
}

#[test]
fn consumer_priority_is_recorded_on_the_decoration() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph.register("bar").add_tag("foo", [("priority", 32.into())]);

    run(&DecoratorPass::new(), &mut graph);

    assert_decorator_exists_for(&graph, "bar", "foo", "decorator.tpl", &ArgumentSlot::Index(0), 32);
}

#[test]
fn template_must_be_abstract() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .add_tag("decorator", [("tag", "foo".into())]);

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "expected service decorator.tpl to be defined as abstract"
    );
}

#[test]
fn missing_decorating_tag_name_fails() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", []);

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "expected tag to be any of [string] in service decorator.tpl"
    );
}

#[test]
fn two_templates_providing_same_decorating_tag_fail() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("tpl_a")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("tpl_b")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "tag foo already provided by tpl_a (issue found on service tpl_b)"
    );
}

#[test]
fn duplicate_consumer_tag_fails() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("bar")
        .add_tag("foo", [])
        .add_tag("foo", [("priority", 8.into())]);

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(error.to_string(), "only one tag foo allowed on service bar");
}

#[test]
fn duplicate_consumer_tag_for_same_argument_fails() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("bar")
        .set_argument(0usize, reference("target"))
        .add_tag("foo", [("argument", 0.into())])
        .add_tag("foo", [("argument", 0.into())]);
    graph.register("target");

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "only one tag foo allowed on service bar and argument 0"
    );
}

#[test]
fn whole_service_chain_applies_higher_priority_innermost() {
    let mut graph = DefinitionGraph::new();
    for (template, tag) in [("tpl_foo", "foo"), ("tpl_bar", "bar"), ("tpl_baz", "baz")] {
        graph
            .register(template)
            .set_abstract(true)
            .add_tag("decorator", [("tag", tag.into())]);
    }
    graph
        .register("consumer")
        .add_tag("foo", [])
        .add_tag("bar", [("priority", 32.into())])
        .add_tag("baz", []);

    run(&DecoratorPass::new(), &mut graph);

    // bar (priority 32) wraps first and ends innermost; foo and baz tie at
    // 0 and follow declaration order, leaving baz outermost.
    assert_eq!(
        graph.decoration_chain("consumer"),
        vec!["consumer.baz", "consumer.foo", "consumer.bar", "consumer"]
    );
    // Synthesized decorators register in tag declaration order.
    assert_key_before(&graph, "consumer.foo", "consumer.bar");
    assert_key_before(&graph, "consumer.bar", "consumer.baz");
}

#[test]
fn argument_is_decorated_through_a_synthesized_alias() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph.register("target");
    graph
        .register("bar")
        .set_argument(0usize, reference("target"))
        .add_tag("foo", [("argument", 0.into())]);

    run(&DecoratorPass::new(), &mut graph);

    let alias_id = assert_decorator_exists_for_argument(
        &graph,
        "bar",
        "foo",
        "decorator.tpl",
        &ArgumentSlot::Index(0),
        &ArgumentSlot::Index(0),
        0,
    );
    assert_eq!(graph.alias_target(&alias_id), Some("target"));
}

#[test]
fn decorated_argument_must_hold_a_reference() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("bar")
        .set_argument(0usize, Argument::Value(TagValue::Int(42)))
        .add_tag("foo", [("argument", 0.into())]);

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "argument 0 must be explicitly defined to reference some service (issue on service bar)"
    );
}

#[test]
fn distinct_decorating_tags_on_one_slot_get_distinct_aliases() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("tpl_foo")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("tpl_bar")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "bar".into())]);
    graph.register("target");
    graph
        .register("consumer")
        .set_argument(0usize, reference("target"))
        .add_tag("foo", [("argument", 0.into())])
        .add_tag("bar", [("argument", 0.into())]);

    run(&DecoratorPass::new(), &mut graph);

    let foo_alias = argument_alias_id("consumer", "foo", &ArgumentSlot::Index(0));
    let bar_alias = argument_alias_id("consumer", "bar", &ArgumentSlot::Index(0));
    assert_ne!(foo_alias, bar_alias);
    assert!(graph.has_alias(&foo_alias));
    assert!(graph.has_alias(&bar_alias));

    // The second occurrence reroutes through the first alias, so the slot
    // ends up chained: consumer -> bar alias -> foo alias -> target.
    assert_eq!(
        graph.definition("consumer").unwrap().argument(&ArgumentSlot::Index(0)),
        Some(&Argument::Ref(bar_alias.clone()))
    );
    assert_eq!(graph.alias_target(&bar_alias), Some(foo_alias.as_str()));
    assert_eq!(graph.alias_target(&foo_alias), Some("target"));
}

#[test]
fn residual_properties_become_tags_on_the_decorator() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph.register("bar").add_tag(
        "foo",
        [
            ("i0_name", "linker".into()),
            ("i0_argument", 1.into()),
            ("priority", 8.into()),
        ],
    );

    run(&DecoratorPass::new(), &mut graph);

    let decorator = graph.definition("bar.foo").unwrap();
    let instances = decorator.tag_instances("linker");
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].get("argument"), Some(&TagValue::Int(1)));
    // Reserved properties never leak into reconstructed tags.
    assert!(instances[0].get("priority").is_none());
}

#[test]
fn template_tags_other_than_the_root_tag_carry_over() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())])
        .add_tag("monolog.logger", [("channel", "app".into())]);
    graph.register("bar").add_tag("foo", []);

    run(&DecoratorPass::new(), &mut graph);

    let decorator = graph.definition("bar.foo").unwrap();
    assert!(decorator.has_tag("monolog.logger"));
    assert!(!decorator.has_tag("decorator"));
}

#[test]
fn proxied_decoration_delegates_to_the_factory() {
    let pass = DecoratorPass::new().with_proxy_factory(NamingProxyFactory);

    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_class("App\\LoggingDecorator")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("bar")
        .set_class("App\\Handler")
        .add_tag("foo", [("proxy", true.into())]);

    run(&pass, &mut graph);

    let decorator = graph.definition("bar.foo").unwrap();
    assert_eq!(
        decorator.class(),
        Some("Proxy<App\\LoggingDecorator, App\\Handler>")
    );
    // The factory shifted the declared slot 0 to 1.
    assert_eq!(
        decorator.argument(&ArgumentSlot::Index(1)),
        Some(&Argument::Ref("bar.foo.inner".to_string()))
    );
}

#[test]
fn proxied_decoration_without_a_factory_fails() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_class("App\\LoggingDecorator")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph
        .register("bar")
        .set_class("App\\Handler")
        .add_tag("foo", [("proxy", true.into())]);

    let mut session = CompileSession::new();
    let error = DecoratorPass::new()
        .process(&mut graph, &mut session)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "no proxy factory registered (proxied decoration requested on service bar)"
    );
}

#[test]
fn reprocessing_with_the_same_session_is_idempotent() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("decorator.tpl")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph.register("bar").add_tag("foo", []);

    let pass = DecoratorPass::new();
    let mut session = CompileSession::new();
    pass.process(&mut graph, &mut session).unwrap();
    let count = graph.len();
    pass.process(&mut graph, &mut session).unwrap();

    assert_eq!(graph.len(), count);
    assert_eq!(
        graph.decoration_chain("bar"),
        vec!["bar.foo", "bar"]
    );
}

#[test]
fn tags_added_between_invocations_are_decorated_on_reprocess() {
    let mut graph = DefinitionGraph::new();
    graph
        .register("tpl_foo")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "foo".into())]);
    graph.register("bar").add_tag("foo", []);

    let pass = DecoratorPass::new();
    let mut session = CompileSession::new();
    pass.process(&mut graph, &mut session).unwrap();

    let first_decorator = serde_json::to_string(graph.definition("bar.foo").unwrap()).unwrap();

    // A later configuration step introduces another template and tags the
    // already-decorated service with it.
    graph
        .register("tpl_baz")
        .set_abstract(true)
        .add_tag("decorator", [("tag", "baz".into()), ("argument", "$baz".into())]);
    graph.definition_mut("bar").unwrap().add_tag("baz", []);
    pass.process(&mut graph, &mut session).unwrap();

    // The earlier decorator is untouched, the late tag is resolved.
    assert_eq!(
        serde_json::to_string(graph.definition("bar.foo").unwrap()).unwrap(),
        first_decorator
    );
    assert_decorator_exists_for(
        &graph,
        "bar",
        "baz",
        "tpl_baz",
        &ArgumentSlot::Name("$baz".to_string()),
        0,
    );
    assert_eq!(
        graph.decoration_chain("bar"),
        vec!["bar.baz", "bar.foo", "bar"]
    );
}

#[test]
fn pass_without_root_tag_declarations_is_a_no_op() {
    let mut graph = DefinitionGraph::new();
    graph.register("bar").add_tag("foo", []);

    run(&DecoratorPass::new(), &mut graph);

    assert_eq!(graph.len(), 1);
}

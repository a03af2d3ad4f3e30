//! Integration tests for derived ancestors and names.


use arbor_model::prelude::*;
use arbor_registry::prelude::*;
use test_utils::*;

// ─────────────────────────────────────────────────────────────────────────────
// Derivation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn fully_qualified_names_join_ancestors_in_camel_case() {
    let mut registry = ModelRegistry::new();
    let foo = named(&mut registry, "foo");
    let bar = child(&mut registry, foo, "bar");
    let baz = child(&mut registry, bar, "baz");

    assert_eq!(registry.fully_qualified_name(foo).unwrap(), "foo");
    assert_eq!(registry.fully_qualified_name(bar).unwrap(), "fooBar");
    assert_eq!(registry.fully_qualified_name(baz).unwrap(), "fooBarBaz");
}

#[test]
fn relative_names_cover_every_ancestor() {
    let mut registry = ModelRegistry::new();
    let main = named(&mut registry, "main");
    let java = child(&mut registry, main, "java");
    let sources = child(&mut registry, java, "sources");

    assert_eq!(
        registry.relative_name(sources, java).unwrap().as_deref(),
        Some("sources")
    );
    assert_eq!(
        registry.relative_name(sources, main).unwrap().as_deref(),
        Some("javaSources")
    );
    assert_eq!(registry.relative_name(sources, sources).unwrap(), None);
    assert_eq!(registry.ancestors(sources).unwrap(), vec![main, java]);
    assert_eq!(
        registry.node(sources).unwrap().ancestors(),
        Some([main, java].as_slice())
    );
}

#[test]
fn unnamed_ancestors_are_skipped() {
    let mut registry = ModelRegistry::new();
    let a = named(&mut registry, "a");
    let anonymous = registry
        .register_node(ModelRegistration::builder().parent(a).build())
        .unwrap();
    let b = child(&mut registry, anonymous, "b");

    assert_eq!(registry.fully_qualified_name(b).unwrap(), "aB");
    assert_eq!(
        registry.relative_name(b, a).unwrap().as_deref(),
        Some("b")
    );
    assert_eq!(
        registry.relative_name(b, anonymous).unwrap().as_deref(),
        Some("b")
    );
    assert!(registry.fully_qualified_name(anonymous).is_err());
}

#[test]
fn names_of_children_added_by_rules_are_derived() {
    let mut registry = ModelRegistry::new();
    registry
        .register_rule(
            ModelSpec::fully_qualified_name("a"),
            ModelAction::new("add_b", |registry, node| {
                registry
                    .register_node(
                        ModelRegistration::builder()
                            .parent(node)
                            .element_name("b")
                            .build(),
                    )
                    .map(|_| ())
            }),
        )
        .unwrap();
    let log = FiringLog::new();
    registry
        .register_rule(ModelSpec::fully_qualified_name("aB"), log.action("found_ab"))
        .unwrap();

    let a = named(&mut registry, "a");
    let b = registry.query(&ModelSpec::owned_by(a));

    assert_eq!(b.len(), 1);
    assert_eq!(registry.fully_qualified_name(b[0]).unwrap(), "aB");
    assert_eq!(log.entries(), vec![("found_ab".to_string(), b[0])]);
}

#[test]
fn names_are_absent_without_their_inputs() {
    let mut registry = ModelRegistry::new();
    let anonymous = root(&mut registry);
    let top = named(&mut registry, "top");

    let node = registry.node(anonymous).unwrap();
    assert!(node.ancestors().is_none());
    assert!(node.fully_qualified_name().is_none());
    assert!(matches!(
        registry.fully_qualified_name(anonymous),
        Err(ModelError::MissingComponent { .. })
    ));

    assert!(registry.node(top).unwrap().ancestors().is_none());
    assert!(matches!(
        registry.relative_name(top, anonymous),
        Err(ModelError::MissingComponent { .. })
    ));
}

#[test]
fn late_element_names_are_derived_once_added() {
    let mut registry = ModelRegistry::new();
    let node = root(&mut registry);
    registry
        .add_component(node, ElementNameComponent(ElementName::new("late").unwrap()))
        .unwrap();

    assert_eq!(registry.fully_qualified_name(node).unwrap(), "late");
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules over names
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn rules_can_select_by_ancestor_and_relative_name() {
    let mut registry = ModelRegistry::new();
    let project = named(&mut registry, "project");
    let log = FiringLog::new();
    registry
        .register_rule(ModelSpec::has_ancestor(project), log.action("inside_project"))
        .unwrap();
    registry
        .register_rule(
            ModelSpec::relative_name(project, "mainCompile"),
            log.action("main_compile"),
        )
        .unwrap();

    let main = child(&mut registry, project, "main");
    let compile = child(&mut registry, main, "compile");
    named(&mut registry, "elsewhere");

    assert_eq!(log.rules_for(main), vec!["inside_project"]);
    assert_eq!(log.rules_for(compile), vec!["inside_project", "main_compile"]);
    assert_eq!(log.entries().len(), 3);
}

#[test]
fn naming_rules_run_before_user_rules() {
    let mut registry = ModelRegistry::new();
    let log = FiringLog::new();
    registry
        .register_rule(
            ModelSpec::has::<ElementNameComponent>(),
            log.action_then("reads_name", |registry, node| {
                assert_eq!(registry.fully_qualified_name(node)?, "first");
                Ok(())
            }),
        )
        .unwrap();

    let node = named(&mut registry, "first");
    assert_eq!(log.rules_for(node), vec!["reads_name"]);
}

#[test]
fn naming_predicates_never_match_when_naming_is_disabled() {
    let mut registry = ModelRegistry::with_config(RegistryConfig::new().with_naming(false));
    let log = FiringLog::new();
    registry
        .register_rule(ModelSpec::fully_qualified_name("solo"), log.action("solo"))
        .unwrap();

    let node = named(&mut registry, "solo");

    assert!(log.entries().is_empty());
    assert!(registry.node(node).unwrap().element_name().is_some());
    assert!(registry.fully_qualified_name(node).is_err());
    assert_eq!(registry.rule_count(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Recomputation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn late_parents_recompute_names_below_them() {
    let mut registry = ModelRegistry::new();
    let a = named(&mut registry, "a");
    let b = named(&mut registry, "b");
    let c = child(&mut registry, b, "c");
    assert_eq!(registry.fully_qualified_name(c).unwrap(), "bC");

    registry.add_component(b, ParentComponent(a)).unwrap();

    assert_eq!(registry.fully_qualified_name(b).unwrap(), "aB");
    assert_eq!(registry.node(b).unwrap().ancestors(), Some([a].as_slice()));
    assert_eq!(registry.relative_name(b, a).unwrap().as_deref(), Some("b"));

    assert_eq!(registry.fully_qualified_name(c).unwrap(), "aBC");
    assert_eq!(registry.node(c).unwrap().ancestors(), Some([a, b].as_slice()));
    assert_eq!(registry.relative_name(c, a).unwrap().as_deref(), Some("bC"));
    assert_eq!(registry.relative_name(c, b).unwrap().as_deref(), Some("c"));
}

#[test]
fn late_names_recompute_descendant_names() {
    let mut registry = ModelRegistry::new();
    let top = root(&mut registry);
    let middle = registry
        .register_node(ModelRegistration::builder().parent(top).build())
        .unwrap();
    let leaf = child(&mut registry, middle, "b");
    assert_eq!(registry.fully_qualified_name(leaf).unwrap(), "b");

    registry
        .add_component(middle, ElementNameComponent(ElementName::new("foo").unwrap()))
        .unwrap();

    assert_eq!(registry.fully_qualified_name(middle).unwrap(), "foo");
    assert_eq!(registry.fully_qualified_name(leaf).unwrap(), "fooB");
    assert_eq!(
        registry.relative_name(leaf, top).unwrap().as_deref(),
        Some("fooB")
    );
    assert_eq!(
        registry.relative_name(leaf, middle).unwrap().as_deref(),
        Some("b")
    );
}

#[test]
fn rules_match_recomputed_names() {
    let mut registry = ModelRegistry::new();
    let log = FiringLog::new();
    let a = named(&mut registry, "a");
    let b = named(&mut registry, "b");
    registry
        .register_rule(ModelSpec::fully_qualified_name("aB"), log.action("on_ab"))
        .unwrap();
    assert!(log.entries().is_empty());

    registry.add_component(b, ParentComponent(a)).unwrap();

    assert_eq!(log.entries(), vec![("on_ab".to_string(), b)]);
}

#[test]
fn renaming_the_node_a_rule_runs_against_is_rejected() {
    let mut registry = ModelRegistry::new();
    let a = named(&mut registry, "a");
    let b = named(&mut registry, "b");
    let err = registry
        .register_rule(
            ModelSpec::self_is(b),
            ModelAction::new("adopt_self", move |registry, node| {
                registry.add_component(node, ParentComponent(a))
            }),
        )
        .unwrap_err();

    assert!(matches!(err, ModelError::IllegalState { .. }), "{err}");
    assert!(err.to_string().contains("adopt_self"));
    assert_eq!(registry.node(b).unwrap().parent(), None);
    assert_eq!(registry.fully_qualified_name(b).unwrap(), "b");
    assert!(registry.node(b).unwrap().ancestors().is_none());
}

#[test]
fn naming_a_parent_from_its_own_rule_renames_children() {
    let mut registry = ModelRegistry::new();
    let top = root(&mut registry);
    let leaf = child(&mut registry, top, "leaf");
    registry
        .register_rule(
            ModelSpec::self_is(top),
            ModelAction::new("name_self", |registry, node| {
                registry.add_component(node, ElementNameComponent(ElementName::new("app")?))
            }),
        )
        .unwrap();

    assert_eq!(registry.fully_qualified_name(top).unwrap(), "app");
    assert_eq!(registry.fully_qualified_name(leaf).unwrap(), "appLeaf");
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid graphs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cyclic_parents_are_rejected() {
    let mut registry = ModelRegistry::with_config(RegistryConfig::new().with_naming(false));
    let a = root(&mut registry);
    let b = registry
        .register_node(ModelRegistration::builder().parent(a).build())
        .unwrap();

    let err = registry.add_component(a, ParentComponent(b)).unwrap_err();
    assert!(matches!(err, ModelError::CyclicParent { .. }));

    let c = root(&mut registry);
    let err = registry.add_component(c, ParentComponent(c)).unwrap_err();
    assert!(matches!(err, ModelError::CyclicParent { .. }));
}

#[test]
fn unknown_parents_are_rejected() {
    let mut registry = ModelRegistry::new();
    let err = registry
        .register_node(
            ModelRegistration::builder()
                .parent(NodeId::new(7))
                .element_name("orphan")
                .build(),
        )
        .unwrap_err();

    assert!(matches!(err, ModelError::UnknownParent { .. }));
    assert!(registry.is_empty());
}

#[test]
fn empty_element_names_are_rejected() {
    let mut registry = ModelRegistry::new();
    let err = registry
        .register_node(ModelRegistration::builder().element_name("").build())
        .unwrap_err();

    assert!(matches!(err, ModelError::InvalidName { .. }));
}

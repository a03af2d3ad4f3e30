//! Integration tests for path-addressed nodes.


use arbor_model::prelude::*;
use arbor_registry::prelude::*;
use test_utils::*;

fn path(value: &str) -> ModelPath {
    ModelPath::parse(value).unwrap()
}

#[test]
fn paths_provide_names_and_parents() {
    let mut registry = ModelRegistry::new();
    let project = registry
        .register_node(ModelRegistration::of(path("project")))
        .unwrap();
    let main = registry
        .register_node(ModelRegistration::of(path("project.main")))
        .unwrap();
    let sources = registry
        .register_node(ModelRegistration::of(path("project.main.sources")))
        .unwrap();

    assert_eq!(registry.get_path(&path("project.main")).unwrap(), main);
    assert_eq!(registry.node(sources).unwrap().parent(), Some(main));
    assert_eq!(registry.ancestors(sources).unwrap(), vec![project, main]);
    assert_eq!(
        registry.fully_qualified_name(sources).unwrap(),
        "projectMainSources"
    );
    assert_eq!(registry.node(main).unwrap().to_string(), "project.main");
}

#[test]
fn explicit_names_override_the_path_segment() {
    let mut registry = ModelRegistry::new();
    registry
        .register_node(ModelRegistration::of(path("build")))
        .unwrap();
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .path(path("build.debug_binary"))
                .element_name("debug")
                .build(),
        )
        .unwrap();

    assert_eq!(registry.fully_qualified_name(node).unwrap(), "buildDebug");
}

#[test]
fn duplicate_paths_are_rejected() {
    let mut registry = ModelRegistry::new();
    registry
        .register_node(ModelRegistration::of(path("app")))
        .unwrap();

    let err = registry
        .register_node(ModelRegistration::of(path("app")))
        .unwrap_err();
    assert!(matches!(err, ModelError::DuplicatePath(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn paths_need_a_registered_parent() {
    let mut registry = ModelRegistry::new();
    let err = registry
        .register_node(ModelRegistration::of(path("missing.child")))
        .unwrap_err();

    assert!(matches!(err, ModelError::UnknownParent { .. }));
    assert!(!registry.has_path(&path("missing.child")));
}

#[test]
fn explicit_parents_must_agree_with_the_path() {
    let mut registry = ModelRegistry::new();
    let project = registry
        .register_node(ModelRegistration::of(path("project")))
        .unwrap();
    let other = root(&mut registry);

    let err = registry
        .register_node(
            ModelRegistration::builder()
                .path(path("project.main"))
                .parent(other)
                .build(),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::ConflictingParent { .. }), "{err}");
    assert!(!registry.has_path(&path("project.main")));

    let main = registry
        .register_node(
            ModelRegistration::builder()
                .path(path("project.main"))
                .parent(project)
                .build(),
        )
        .unwrap();
    assert_eq!(registry.node(main).unwrap().parent(), Some(project));
}

#[test]
fn unknown_paths_are_reported() {
    let registry = ModelRegistry::new();
    let err = registry.get_path(&path("nowhere")).unwrap_err();

    assert!(matches!(err, ModelError::UnknownPath(_)));
    assert_eq!(registry.find_path(&path("nowhere")), None);
}

#[test]
fn malformed_paths_are_rejected() {
    assert!(ModelPath::parse("").is_err());
    assert!(ModelPath::parse("a..b").is_err());
}

#[test]
fn rules_can_select_by_path() {
    let mut registry = ModelRegistry::new();
    let log = FiringLog::new();
    registry
        .register_rule(
            ModelSpec::descendant_of(path("tasks")),
            log.action("under_tasks"),
        )
        .unwrap();
    registry
        .register_rule(ModelSpec::path(path("tasks.build")), log.action("build"))
        .unwrap();

    let tasks = registry
        .register_node(ModelRegistration::of(path("tasks")))
        .unwrap();
    let build = registry
        .register_node(ModelRegistration::of(path("tasks.build")))
        .unwrap();
    let compile = registry
        .register_node(ModelRegistration::of(path("tasks.build.compile")))
        .unwrap();

    assert!(log.rules_for(tasks).is_empty());
    assert_eq!(log.rules_for(build), vec!["under_tasks", "build"]);
    assert_eq!(log.rules_for(compile), vec!["under_tasks"]);
}

#[test]
fn nodes_without_paths_mix_with_addressed_ones() {
    let mut registry = ModelRegistry::new();
    let app = registry
        .register_node(ModelRegistration::of(path("app")))
        .unwrap();
    let helper = child(&mut registry, app, "helper");

    assert_eq!(registry.node(helper).unwrap().path(), None);
    assert_eq!(registry.fully_qualified_name(helper).unwrap(), "appHelper");
    assert_eq!(registry.query(&ModelSpec::descendant_of(path("app"))), Vec::new());
}

//! Integration tests for projections, views and object ownership.


use arbor_model::prelude::*;
use arbor_registry::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_utils::*;

fn executable(registry: &mut ModelRegistry, name: &str) -> NodeId {
    let exe = Executable {
        name: name.to_string(),
    };
    registry
        .register_node(
            ModelRegistration::builder()
                .element_name(name)
                .projection(ModelProjection::fixed_with(executable_type(), exe))
                .build(),
        )
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn nodes_can_be_viewed_as_declared_types() {
    let mut registry = ModelRegistry::new();
    let app = executable(&mut registry, "app");

    let exe: Arc<Executable> = registry.view(app).unwrap();
    let named: Arc<dyn Named> = registry.view(app).unwrap();

    assert_eq!(exe.name, "app");
    assert_eq!(named.name(), "app");
    assert!(registry.can_be_viewed_as::<dyn Named>(app).unwrap());
    assert!(!registry.can_be_viewed_as::<Library>(app).unwrap());
}

#[test]
fn undeclared_views_are_a_type_mismatch() {
    let mut registry = ModelRegistry::new();
    let app = executable(&mut registry, "app");

    let err = registry.view::<Library>(app).unwrap_err();
    match err {
        ModelError::TypeMismatch { available, .. } => assert!(available.contains("Executable")),
        other => panic!("expected a type mismatch, got {other}"),
    }

    let bare = root(&mut registry);
    assert!(matches!(
        registry.view::<Library>(bare),
        Err(ModelError::TypeMismatch { .. })
    ));
}

#[test]
fn first_declaring_projection_wins() {
    let mut registry = ModelRegistry::new();
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .projection(ModelProjection::fixed_with(
                    ModelType::builder::<Library>().viewable_as(|it| it as Arc<dyn Named>),
                    Library,
                ))
                .projection(ModelProjection::fixed_with(
                    executable_type(),
                    Executable {
                        name: "second".to_string(),
                    },
                ))
                .build(),
        )
        .unwrap();

    let named: Arc<dyn Named> = registry.view(node).unwrap();
    assert_eq!(named.name(), "library");
    let exe: Arc<Executable> = registry.view(node).unwrap();
    assert_eq!(exe.name, "second");
}

#[test]
fn memoizing_projections_build_once() {
    let mut registry = ModelRegistry::new();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .projection(ModelProjection::memoizing(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Library
                }))
                .build(),
        )
        .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 0);

    let first: Arc<Library> = registry.view(node).unwrap();
    let second: Arc<Library> = registry.view(node).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn transient_projections_build_every_time() {
    let mut registry = ModelRegistry::new();
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .projection(ModelProjection::transient(|| Executable {
                    name: "fresh".to_string(),
                }))
                .build(),
        )
        .unwrap();

    let first: Arc<Executable> = registry.view(node).unwrap();
    let second: Arc<Executable> = registry.view(node).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(registry.owner_of(&first), Some(node));
    assert_eq!(registry.owner_of(&second), Some(node));
}

#[test]
fn projections_added_later_are_matched() {
    let mut registry = ModelRegistry::new();
    let log = FiringLog::new();
    registry
        .register_rule(ModelSpec::subtype_of::<dyn Named>(), log.action("named"))
        .unwrap();

    let node = root(&mut registry);
    assert!(log.entries().is_empty());

    registry
        .add_projection(node, ModelProjection::fixed_with(executable_type(), Executable::default()))
        .unwrap();
    assert_eq!(log.rules_for(node), vec!["named"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Managed projections
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn managed_projections_are_created_by_the_factory() {
    let factory = DefaultObjectFactory::new().with(|| Executable {
        name: "managed".to_string(),
    });
    let mut registry =
        ModelRegistry::with_config(RegistryConfig::new().object_factory(Arc::new(factory)));
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .projection(ModelProjection::managed_with(executable_type()))
                .build(),
        )
        .unwrap();

    let named: Arc<dyn Named> = registry.view(node).unwrap();
    let exe: Arc<Executable> = registry.view(node).unwrap();

    assert_eq!(named.name(), "managed");
    assert_eq!(exe.name, "managed");
    assert_eq!(registry.owner_of(&named), Some(node));
}

#[test]
fn unbound_managed_projections_cannot_be_resolved() {
    let mut registry = ModelRegistry::new();
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .projection(ModelProjection::managed::<Library>())
                .build(),
        )
        .unwrap();

    assert!(matches!(
        registry.can_be_viewed_as::<Library>(node),
        Err(ModelError::UnresolvedProjection { .. })
    ));
    assert!(matches!(
        registry.view::<Library>(node),
        Err(ModelError::UnresolvedProjection { .. })
    ));
}

#[test]
fn factories_without_a_constructor_fail_to_instantiate() {
    let factory = DefaultObjectFactory::new().with_default::<Executable>();
    let mut registry =
        ModelRegistry::with_config(RegistryConfig::new().object_factory(Arc::new(factory)));
    let node = registry
        .register_node(
            ModelRegistration::builder()
                .projection(ModelProjection::managed::<Library>())
                .build(),
        )
        .unwrap();

    assert!(registry.can_be_viewed_as::<Library>(node).unwrap());
    assert!(matches!(
        registry.view::<Library>(node),
        Err(ModelError::Instantiation { .. })
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Ownership
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn owners_are_found_through_any_view() {
    let mut registry = ModelRegistry::new();
    let app = executable(&mut registry, "app");
    let tool = executable(&mut registry, "tool");

    let app_named: Arc<dyn Named> = registry.view(app).unwrap();
    let tool_exe: Arc<Executable> = registry.view(tool).unwrap();

    assert_eq!(registry.owner_of(&app_named), Some(app));
    assert_eq!(registry.owner_of(&tool_exe), Some(tool));
}

#[test]
fn foreign_objects_have_no_owner() {
    let registry = ModelRegistry::new();
    let stranger = Arc::new(Library);
    assert_eq!(registry.owner_of(&stranger), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Convenience rules
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn configure_each_runs_for_realized_views() {
    let mut registry = ModelRegistry::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    registry
        .configure_each::<dyn Named, _>("collect_names", move |_, _, named| {
            record.lock().unwrap().push(named.name());
            Ok(())
        })
        .unwrap();

    let app = executable(&mut registry, "app");
    executable(&mut registry, "tool");
    assert!(seen.lock().unwrap().is_empty());

    registry.transition(app, ModelState::Realized).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["app".to_string()]);
}

#[test]
fn configure_named_selects_by_fully_qualified_name() {
    let mut registry = ModelRegistry::new();
    let log = FiringLog::new();
    let record = log.clone();
    registry
        .configure_named::<Executable, _>("appTest", move |_, node, exe| {
            record.record(&exe.name, node);
            Ok(())
        })
        .unwrap();

    let app = executable(&mut registry, "app");
    let test = registry
        .register_node(
            ModelRegistration::builder()
                .parent(app)
                .element_name("test")
                .projection(ModelProjection::fixed(Executable {
                    name: "app-test".to_string(),
                }))
                .build(),
        )
        .unwrap();

    registry.transition(app, ModelState::Realized).unwrap();
    registry.transition(test, ModelState::Realized).unwrap();

    assert_eq!(log.entries(), vec![("app-test".to_string(), test)]);
}

#[test]
fn known_elements_are_reported_without_realizing() {
    let mut registry = ModelRegistry::new();
    let known = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&known);
    registry
        .when_element_known::<dyn Named, _>("remember", move |_, element| {
            record.lock().unwrap().push(element);
            Ok(())
        })
        .unwrap();

    let app = executable(&mut registry, "app");
    let element = known.lock().unwrap()[0];

    assert_eq!(element.node(), app);
    assert_eq!(registry.state(app).unwrap(), ModelState::Registered);

    let named = element.realize(&mut registry).unwrap();
    assert_eq!(named.name(), "app");
    assert_eq!(registry.state(app).unwrap(), ModelState::Realized);
}

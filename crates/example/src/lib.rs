//! Example native project model built with Arbor.
//!
//! A project is a tree of components. Components tagged as executables or
//! libraries get a base name derived from their fully-qualified name, and
//! project a binary object once realized.
//!
//! # Architecture
//!
//! ```text
//! project ──┬── main     (executable, c++)
//!           └── utils    (library, c)
//!                 └── io (library, c)
//! ```
//!
//! [`NativePlugin`] installs the rules; [`register_project`] builds the
//! tree above with [`native_component`].

use arbor_model::prelude::*;
use arbor_registry::prelude::*;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Components
// ─────────────────────────────────────────────────────────────────────────────

/// Source language of a native component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLanguage(pub &'static str);

impl Component for SourceLanguage {}

/// Output file stem, defaulting to the fully-qualified name.
#[derive(Debug, Clone)]
pub struct BaseName(pub Property<String>);

impl Component for BaseName {}

/// Any native component.
pub struct NativeComponent;

impl ModelTag for NativeComponent {}

/// A native component linked into an executable.
pub struct ExecutableComponent;

impl ModelTag for ExecutableComponent {
    fn implied() -> Vec<ComponentId> {
        vec![ComponentId::of_tag::<NativeComponent>()]
    }
}

/// A native component archived into a library.
pub struct LibraryComponent;

impl ModelTag for LibraryComponent {
    fn implied() -> Vec<ComponentId> {
        vec![ComponentId::of_tag::<NativeComponent>()]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binaries
// ─────────────────────────────────────────────────────────────────────────────

/// A linked output.
pub trait Binary: Send + Sync {
    /// Returns the output file name.
    fn file_name(&self) -> String;
}

/// An executable binary.
#[derive(Debug)]
pub struct Executable {
    base_name: Property<String>,
}

impl Binary for Executable {
    fn file_name(&self) -> String {
        self.base_name.get().unwrap_or_default()
    }
}

/// A static library.
#[derive(Debug)]
pub struct StaticLibrary {
    base_name: Property<String>,
}

impl Binary for StaticLibrary {
    fn file_name(&self) -> String {
        format!("lib{}.a", self.base_name.get().unwrap_or_default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

/// Installs the native component rules.
///
/// | Rule | Applies to | Effect |
/// |------|------------|--------|
/// | `base_name_convention` | named native components | [`BaseName`] defaults to the qualified name |
/// | `default_language` | discovered native components | adds `c` if no language is set |
#[derive(Debug, Default)]
pub struct NativePlugin;

impl Plugin for NativePlugin {
    fn apply(&self, registry: &mut ModelRegistry) -> Result<()> {
        registry.register_rule(
            ModelSpec::has_tag::<NativeComponent>(),
            ModelAction::with_inputs2(
                "base_name_convention",
                |_, _, base: BaseName, name: FullyQualifiedNameComponent| {
                    base.0.set_convention(move || name.as_str().to_string());
                    Ok(())
                },
            ),
        )?;
        registry.register_rule(
            ModelSpec::has_tag::<NativeComponent>()
                .and(ModelSpec::state_at_least(ModelState::Discovered)),
            ModelAction::new("default_language", |registry, node| {
                if registry.has_component::<SourceLanguage>(node)? {
                    return Ok(());
                }
                registry.add_component(node, SourceLanguage("c"))
            }),
        )?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Project
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of native component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Linked into an [`Executable`].
    Executable,
    /// Archived into a [`StaticLibrary`].
    Library,
}

/// Describes a native component at `path`, projecting its binary.
#[must_use]
pub fn native_component(path: ModelPath, kind: Kind) -> ModelRegistrationBuilder {
    let base_name = Property::new();
    let shared = base_name.clone();
    let builder = ModelRegistration::builder()
        .path(path)
        .component(BaseName(base_name));
    match kind {
        Kind::Executable => builder.tag::<ExecutableComponent>().projection(
            ModelProjection::memoizing_with(
                ModelType::builder::<Executable>().viewable_as(|it| it as Arc<dyn Binary>),
                move || Executable {
                    base_name: shared.clone(),
                },
            ),
        ),
        Kind::Library => builder.tag::<LibraryComponent>().projection(
            ModelProjection::memoizing_with(
                ModelType::builder::<StaticLibrary>().viewable_as(|it| it as Arc<dyn Binary>),
                move || StaticLibrary {
                    base_name: shared.clone(),
                },
            ),
        ),
    }
}

/// Registers the example project and returns its nodes, outermost first.
///
/// # Errors
///
/// Returns any error raised while registering nodes or running rules.
pub fn register_project(registry: &mut ModelRegistry) -> Result<Vec<NodeId>> {
    let project = ModelPath::parse("project")?;
    let utils = project.child("utils")?;

    let mut nodes = vec![registry.register_node(ModelRegistration::of(project.clone()))?];
    nodes.push(registry.register_node(
        native_component(project.child("main")?, Kind::Executable)
            .component(SourceLanguage("c++"))
            .build(),
    )?);
    nodes.push(registry.register_node(native_component(utils.clone(), Kind::Library).build())?);
    nodes.push(registry.register_node(native_component(utils.child("io")?, Kind::Library).build())?);
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> (ModelRegistry, Vec<NodeId>) {
        let mut registry = ModelRegistry::new();
        registry.apply_plugin(NativePlugin).unwrap();
        let nodes = register_project(&mut registry).unwrap();
        (registry, nodes)
    }

    #[test]
    fn base_names_follow_qualified_names() {
        let (mut registry, nodes) = project();
        let io: Arc<dyn Binary> = registry.view(nodes[3]).unwrap();
        assert_eq!(io.file_name(), "libprojectUtilsIo.a");

        let main: Arc<dyn Binary> = registry.view(nodes[1]).unwrap();
        assert_eq!(main.file_name(), "projectMain");
    }

    #[test]
    fn base_names_can_be_overridden() {
        let (mut registry, nodes) = project();
        registry
            .get_component::<BaseName>(nodes[1])
            .unwrap()
            .0
            .set("app".to_string());

        let main: Arc<Executable> = registry.view(nodes[1]).unwrap();
        assert_eq!(main.file_name(), "app");
    }

    #[test]
    fn languages_default_once_discovered() {
        let (mut registry, nodes) = project();
        assert!(!registry.has_component::<SourceLanguage>(nodes[2]).unwrap());

        registry.transition(nodes[2], ModelState::Discovered).unwrap();
        assert_eq!(
            registry.get_component::<SourceLanguage>(nodes[2]).unwrap(),
            &SourceLanguage("c")
        );

        registry.transition(nodes[1], ModelState::Discovered).unwrap();
        assert_eq!(
            registry.get_component::<SourceLanguage>(nodes[1]).unwrap(),
            &SourceLanguage("c++")
        );
    }

    #[test]
    fn the_project_root_is_not_a_binary() {
        let (registry, nodes) = project();
        assert!(!registry.can_be_viewed_as::<dyn Binary>(nodes[0]).unwrap());
        assert_eq!(registry.query(&ModelSpec::has_tag::<NativeComponent>()).len(), 3);
    }
}

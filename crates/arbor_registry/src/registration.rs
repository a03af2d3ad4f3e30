//! Node registrations.

use arbor_model::component::{Component, ModelTag, tag};
use arbor_model::names::ParentComponent;
use arbor_model::path::ModelPath;
use arbor_model::projection::ModelProjection;
use arbor_model::NodeId;

/// Everything a node starts out with.
///
/// # Example
///
/// ```
/// use arbor_model::prelude::*;
/// use arbor_registry::prelude::*;
///
/// struct Binary;
/// impl ModelTag for Binary {}
///
/// let mut registry = ModelRegistry::new();
/// let app = registry
///     .register_node(ModelRegistration::builder().element_name("app").build())
///     .unwrap();
/// let debug = registry
///     .register_node(
///         ModelRegistration::builder()
///             .parent(app)
///             .element_name("debug")
///             .tag::<Binary>()
///             .build(),
///     )
///     .unwrap();
/// assert_eq!(registry.fully_qualified_name(debug).unwrap(), "appDebug");
/// ```
#[derive(Debug, Default)]
pub struct ModelRegistration {
    pub(crate) path: Option<ModelPath>,
    pub(crate) element_name: Option<String>,
    pub(crate) components: Vec<Box<dyn Component>>,
    pub(crate) projections: Vec<ModelProjection>,
}

impl ModelRegistration {
    /// Starts a registration.
    #[must_use]
    pub fn builder() -> ModelRegistrationBuilder {
        ModelRegistrationBuilder::default()
    }

    /// A registration at `path` with nothing else attached.
    #[must_use]
    pub fn of(path: ModelPath) -> Self {
        Self::builder().path(path).build()
    }

    /// Returns the path, if any.
    #[must_use]
    pub fn get_path(&self) -> Option<&ModelPath> {
        self.path.as_ref()
    }
}

/// Builder for [`ModelRegistration`].
#[derive(Debug, Default)]
#[must_use]
pub struct ModelRegistrationBuilder {
    registration: ModelRegistration,
}

impl ModelRegistrationBuilder {
    /// Registers the node at `path`.
    ///
    /// The parent path must already be registered. Unless given
    /// explicitly, the element name is the last segment and the parent is
    /// the node at the parent path.
    pub fn path(mut self, path: ModelPath) -> Self {
        self.registration.path = Some(path);
        self
    }

    /// Sets the element name.
    pub fn element_name(mut self, name: impl Into<String>) -> Self {
        self.registration.element_name = Some(name.into());
        self
    }

    /// Sets the parent node.
    pub fn parent(self, parent: NodeId) -> Self {
        self.component(ParentComponent(parent))
    }

    /// Attaches a component.
    pub fn component<T: Component>(mut self, value: T) -> Self {
        self.registration.components.push(Box::new(value));
        self
    }

    /// Attaches a type-erased component.
    pub fn boxed_component(mut self, value: Box<dyn Component>) -> Self {
        self.registration.components.push(value);
        self
    }

    /// Attaches tag `T`.
    pub fn tag<T: ModelTag>(self) -> Self {
        self.component(tag::<T>())
    }

    /// Adds a projection.
    pub fn projection(mut self, projection: ModelProjection) -> Self {
        self.registration.projections.push(projection);
        self
    }

    /// Finishes the registration.
    pub fn build(self) -> ModelRegistration {
        self.registration
    }
}

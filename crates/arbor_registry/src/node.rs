//! Model nodes: the vertices of the model graph.

use arbor_model::component::{Component, ComponentId, ComponentStore, ModelTag};
use arbor_model::names::{
    AncestorsComponent, ElementName, ElementNameComponent, FullyQualifiedNameComponent,
    ParentComponent, RelativeNamesComponent,
};
use arbor_model::path::ModelPath;
use arbor_model::projection::{ModelProjection, TypeKey};
use arbor_model::state::ModelState;
use arbor_model::{ModelError, NodeId, Result};
use core::fmt;

/// A node of the model graph.
///
/// Nodes are owned by a [`ModelRegistry`](crate::registry::ModelRegistry)
/// and only mutated through it, so that every change is seen by the rule
/// engine. This type is the read-only snapshot that predicates evaluate
/// against.
#[derive(Debug)]
pub struct ModelNode {
    id: NodeId,
    path: Option<ModelPath>,
    state: ModelState,
    components: ComponentStore,
    projections: Vec<ModelProjection>,
}

impl ModelNode {
    pub(crate) fn new(id: NodeId, path: Option<ModelPath>) -> Self {
        Self {
            id,
            path,
            state: ModelState::Registered,
            components: ComponentStore::new(),
            projections: Vec::new(),
        }
    }

    /// Returns the node's id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the path the node was registered at, if any.
    #[must_use]
    pub fn path(&self) -> Option<&ModelPath> {
        self.path.as_ref()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Returns the component store.
    #[must_use]
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Returns the projections in declaration order.
    #[must_use]
    pub fn projections(&self) -> &[ModelProjection] {
        &self.projections
    }

    /// Returns the component of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingComponent`] if it is not attached.
    pub fn get<T: Component>(&self) -> Result<&T> {
        self.find::<T>().ok_or_else(|| ModelError::MissingComponent {
            node: self.to_string(),
            component: core::any::type_name::<T>(),
        })
    }

    /// Returns the component of type `T`, if attached.
    #[must_use]
    pub fn find<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// Returns `true` if a component of type `T`, or one declaring `T` as a
    /// capability, is attached.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.has_component(ComponentId::of::<T>())
    }

    /// Id-based form of [`has`](Self::has).
    #[must_use]
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.components.has(id)
    }

    /// Returns `true` if tag `T`, or a tag implying it, is attached.
    #[must_use]
    pub fn has_tag<T: ModelTag>(&self) -> bool {
        self.has_component(ComponentId::of_tag::<T>())
    }

    /// Returns the parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.find::<ParentComponent>().map(|parent| parent.0)
    }

    /// Returns the element name, if any.
    #[must_use]
    pub fn element_name(&self) -> Option<&ElementName> {
        self.find::<ElementNameComponent>().map(|name| &name.0)
    }

    /// Returns the derived ancestors, outermost first.
    #[must_use]
    pub fn ancestors(&self) -> Option<&[NodeId]> {
        self.find::<AncestorsComponent>().map(|ancestors| ancestors.0.as_slice())
    }

    /// Returns the derived fully-qualified name.
    #[must_use]
    pub fn fully_qualified_name(&self) -> Option<&str> {
        self.find::<FullyQualifiedNameComponent>()
            .map(FullyQualifiedNameComponent::as_str)
    }

    /// Returns the derived name relative to `ancestor`.
    #[must_use]
    pub fn relative_name(&self, ancestor: NodeId) -> Option<&str> {
        self.find::<RelativeNamesComponent>()
            .and_then(|names| names.get(ancestor))
    }

    /// Returns `true` if any derived naming component is attached.
    #[must_use]
    pub fn has_derived_names(&self) -> bool {
        self.has::<AncestorsComponent>()
            || self.has::<FullyQualifiedNameComponent>()
            || self.has::<RelativeNamesComponent>()
    }

    /// Returns `true` if some projection declares a view as `key`.
    #[must_use]
    pub fn declares(&self, key: TypeKey) -> bool {
        self.projections.iter().any(|projection| projection.declares(key))
    }

    /// Describes the declared projection types, for error messages.
    #[must_use]
    pub fn projection_types(&self) -> String {
        if self.projections.is_empty() {
            return "none".to_string();
        }
        self.projections
            .iter()
            .map(|projection| projection.model_type().view_names().join(" | "))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn components_mut(&mut self) -> &mut ComponentStore {
        &mut self.components
    }

    pub(crate) fn push_projection(&mut self, projection: ModelProjection) {
        self.projections.push(projection);
    }

    /// Moves the node to `state`.
    ///
    /// Setting the current state again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IllegalState`] if `state` is earlier than the
    /// current state.
    pub(crate) fn set_state(&mut self, state: ModelState) -> Result<()> {
        if state < self.state {
            return Err(ModelError::illegal_state(
                &*self,
                format!("cannot move from {} back to {}", self.state, state),
            ));
        }
        self.state = state;
        Ok(())
    }
}

impl fmt::Display for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path}"),
            None => write!(f, "{}", self.id),
        }
    }
}

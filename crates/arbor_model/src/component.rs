//! Components and the per-node component store.
//!
//! A node carries an open set of typed components, at most one value per
//! concrete type. Components are type-erased behind [`Component`] and
//! recovered with `downcast-rs`.
//!
//! # Tags and capabilities
//!
//! Tags are zero-sized markers declared with [`ModelTag`] and stored as
//! [`TagComponent<T>`]. A component may also answer to additional ids via
//! [`Component::capabilities`]; tags use this to imply broader tags, which
//! gives simple component families:
//!
//! ```
//! use arbor_model::component::{tag, ComponentId, ComponentStore, ModelTag};
//!
//! struct Native;
//! impl ModelTag for Native {}
//!
//! struct Binary;
//! impl ModelTag for Binary {
//!     fn implied() -> Vec<ComponentId> {
//!         vec![ComponentId::of_tag::<Native>()]
//!     }
//! }
//!
//! let mut store = ComponentStore::new();
//! store.insert(tag::<Binary>());
//! assert!(store.has(ComponentId::of_tag::<Native>()));
//! ```

use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use downcast_rs::{DowncastSync, impl_downcast};
use hashbrown::HashSet;
use indexmap::IndexMap;

/// A typed value that can be attached to a model node.
///
/// Implementations are explicit so that every component type states
/// whether it takes part in the node's identity.
///
/// # Example
///
/// ```
/// use arbor_model::component::Component;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct BaseName(String);
///
/// impl Component for BaseName {}
/// ```
pub trait Component: DowncastSync + fmt::Debug {
    /// Whether the component contributes to the identity of its node.
    ///
    /// Identity components are write-once: they can be added but never
    /// replaced by callers. The registry recomputes derived naming
    /// components itself.
    fn is_identity(&self) -> bool {
        false
    }

    /// Whether the component is a marker tag.
    fn is_tag(&self) -> bool {
        false
    }

    /// Additional component ids this value answers to in `has` queries.
    fn capabilities(&self) -> Vec<ComponentId> {
        Vec::new()
    }

    /// Returns the concrete type name for diagnostics.
    fn component_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl_downcast!(sync Component);

/// Identifies a component type.
///
/// Equality and hashing use the [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct ComponentId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentId {
    /// Returns the id of component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the id under which tag `T` is stored.
    #[must_use]
    pub fn of_tag<T: ModelTag>() -> Self {
        Self::of::<TagComponent<T>>()
    }

    /// Returns the id of the concrete type behind an erased component.
    #[must_use]
    pub fn of_val(value: &dyn Component) -> Self {
        Self {
            type_id: value.as_any().type_id(),
            type_name: value.component_name(),
        }
    }

    /// Returns the underlying type id.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ComponentId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentId {}

impl Hash for ComponentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tags
// ─────────────────────────────────────────────────────────────────────────────

/// Marker trait for tag types.
pub trait ModelTag: Send + Sync + 'static {
    /// Broader tags that a node carrying this tag also satisfies.
    fn implied() -> Vec<ComponentId>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// Storage form of tag `T`.
pub struct TagComponent<T>(PhantomData<fn() -> T>);

/// Creates the component form of tag `T`.
#[must_use]
pub fn tag<T: ModelTag>() -> TagComponent<T> {
    TagComponent(PhantomData)
}

impl<T> Clone for TagComponent<T> {
    fn clone(&self) -> Self {
        Self(PhantomData)
    }
}

impl<T> PartialEq for TagComponent<T> {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl<T> fmt::Debug for TagComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag<{}>", core::any::type_name::<T>())
    }
}

impl<T: ModelTag> Component for TagComponent<T> {
    fn is_identity(&self) -> bool {
        true
    }

    fn is_tag(&self) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<ComponentId> {
        T::implied()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ComponentStore
// ─────────────────────────────────────────────────────────────────────────────

/// Open map from component type to component value.
///
/// Iteration follows insertion order. Replacing a value keeps its
/// original position.
#[derive(Debug, Default)]
pub struct ComponentStore {
    entries: IndexMap<ComponentId, Box<dyn Component>>,
    capabilities: HashSet<ComponentId>,
}

impl ComponentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no component is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a value of exactly this type is stored.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns `true` if a stored value is of this type or declares it as a
    /// capability.
    #[must_use]
    pub fn has(&self, id: ComponentId) -> bool {
        self.contains(id) || self.capabilities.contains(&id)
    }

    /// Returns the value of type `T`, if present.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.entries
            .get(&ComponentId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns the erased value stored under `id`, if present.
    #[must_use]
    pub fn get_by_id(&self, id: ComponentId) -> Option<&dyn Component> {
        self.entries.get(&id).map(AsRef::as_ref)
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert<T: Component>(&mut self, value: T) -> Option<Box<dyn Component>> {
        self.insert_boxed(Box::new(value))
    }

    /// Inserts an erased value, returning the one it replaced.
    pub fn insert_boxed(&mut self, value: Box<dyn Component>) -> Option<Box<dyn Component>> {
        let id = ComponentId::of_val(value.as_ref());
        let added = value.capabilities();
        let previous = self.entries.insert(id, value);
        if previous.is_some() {
            self.rebuild_capabilities();
        } else {
            self.capabilities.extend(added);
        }
        previous
    }

    /// Inserts an erased value only if its type is absent.
    ///
    /// # Errors
    ///
    /// Hands the value back if a value of the same type is already stored.
    pub fn try_insert_boxed(
        &mut self,
        value: Box<dyn Component>,
    ) -> Result<(), Box<dyn Component>> {
        if self.contains(ComponentId::of_val(value.as_ref())) {
            return Err(value);
        }
        self.insert_boxed(value);
        Ok(())
    }

    /// Removes the value stored under `id`, returning it.
    ///
    /// Later components keep their relative order.
    pub fn remove(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let removed = self.entries.shift_remove(&id);
        if removed.is_some() {
            self.rebuild_capabilities();
        }
        removed
    }

    /// Iterates over stored components in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> {
        self.entries.iter().map(|(id, value)| (*id, value.as_ref()))
    }

    /// Iterates over the ids of stored components in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> {
        self.entries.keys().copied()
    }

    fn rebuild_capabilities(&mut self) {
        self.capabilities = self
            .entries
            .values()
            .flat_map(|value| value.capabilities())
            .collect();
    }
}

/// Returns `true` if the erased value is of type `T`.
#[must_use]
pub fn is_component<T: Component>(value: &dyn Component) -> bool {
    value.as_any().is::<T>()
}

//! Settable, readable-later values.

use crate::component::Component;
use core::fmt;
use parking_lot::RwLock;
use std::sync::Arc;

type Convention<T> = Arc<dyn Fn() -> T + Send + Sync>;

struct Slot<T> {
    value: Option<T>,
    convention: Option<Convention<T>>,
}

/// A value that can be set now and read later.
///
/// Clones share the same slot, so a property handed to a rule and the one
/// stored on a node observe each other's writes. An explicitly set value
/// wins over the convention.
///
/// ```
/// use arbor_model::property::Property;
///
/// let base_name = Property::<String>::new().convention(|| "app".to_string());
/// assert_eq!(base_name.get().as_deref(), Some("app"));
///
/// let shared = base_name.clone();
/// shared.set("tool".to_string());
/// assert_eq!(base_name.get().as_deref(), Some("tool"));
/// ```
pub struct Property<T> {
    slot: Arc<RwLock<Slot<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Creates an empty property.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                value: None,
                convention: None,
            })),
        }
    }

    /// Creates a property holding `value`.
    #[must_use]
    pub fn of(value: T) -> Self {
        let property = Self::new();
        property.set(value);
        property
    }

    /// Sets the value used when none is set explicitly.
    #[must_use]
    pub fn convention(self, supplier: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.set_convention(supplier);
        self
    }

    /// Replaces the convention of this property and all its clones.
    pub fn set_convention(&self, supplier: impl Fn() -> T + Send + Sync + 'static) {
        self.slot.write().convention = Some(Arc::new(supplier));
    }

    /// Sets the value.
    pub fn set(&self, value: T) {
        self.slot.write().value = Some(value);
    }

    /// Returns the set value, else the convention, else `None`.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        let slot = self.slot.read();
        match (&slot.value, &slot.convention) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(convention)) => Some(convention()),
            (None, None) => None,
        }
    }

    /// Returns `true` if a value or convention is available.
    #[must_use]
    pub fn is_present(&self) -> bool {
        let slot = self.slot.read();
        slot.value.is_some() || slot.convention.is_some()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("Property")
            .field("value", &slot.value)
            .field("convention", &slot.convention.is_some())
            .finish()
    }
}

impl<T: fmt::Debug + Send + Sync + 'static> Component for Property<T> {}

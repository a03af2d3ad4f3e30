//! Projections: how a node produces the objects it can be viewed as.
//!
//! A [`ModelProjection`] pairs a [`ModelType`] with a source of instances.
//! The type declares the concrete object type and the other types
//! (typically trait objects) the object may be viewed as. The set of
//! sources is closed:
//!
//! | Kind | Instances |
//! |------|-----------|
//! | [`Fixed`](ProjectionKind::Fixed) | One pre-built instance |
//! | [`Memoizing`](ProjectionKind::Memoizing) | Built on first use, then cached |
//! | [`Transient`](ProjectionKind::Transient) | Built on every use |
//! | [`Managed`](ProjectionKind::Managed) | Built by an [`ObjectFactory`] once bound, then cached |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use arbor_model::projection::{ModelProjection, ModelType};
//!
//! trait Named: Send + Sync {
//!     fn name(&self) -> String;
//! }
//!
//! struct Executable;
//! impl Named for Executable {
//!     fn name(&self) -> String {
//!         "app".into()
//!     }
//! }
//!
//! let projection = ModelProjection::fixed_with(
//!     ModelType::builder::<Executable>().viewable_as(|it| it as Arc<dyn Named>),
//!     Executable,
//! );
//!
//! let named = projection.get::<dyn Named>().unwrap().unwrap();
//! assert_eq!(named.name(), "app");
//! ```

use crate::error::{ModelError, Result};
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// A type-erased object produced by a projection.
pub type AnyObject = Arc<dyn Any + Send + Sync>;

type Supplier = Arc<dyn Fn() -> Result<AnyObject> + Send + Sync>;
type ViewCast = Arc<dyn Fn(AnyObject) -> Option<Box<dyn Any>> + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// TypeKey
// ─────────────────────────────────────────────────────────────────────────────

/// Identifies a possibly unsized type such as `dyn Trait`.
///
/// Equality and hashing use the [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModelType
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct View {
    key: TypeKey,
    cast: ViewCast,
}

/// The concrete type of a projected object plus the types it can be viewed
/// as. Viewing as the concrete type itself is always possible.
#[derive(Clone)]
pub struct ModelType {
    concrete: TypeKey,
    views: Vec<View>,
}

impl ModelType {
    /// A model type for `T` with no views besides `T` itself.
    #[must_use]
    pub fn of<T: Send + Sync + 'static>() -> Self {
        Self::builder::<T>().build()
    }

    /// Starts declaring the views of `T`.
    #[must_use]
    pub fn builder<T: Send + Sync + 'static>() -> ModelTypeBuilder<T> {
        ModelTypeBuilder {
            views: vec![View {
                key: TypeKey::of::<T>(),
                cast: erase_cast::<T, T>(|it| it),
            }],
            _marker: PhantomData,
        }
    }

    /// Returns the concrete type.
    #[must_use]
    pub fn concrete(&self) -> TypeKey {
        self.concrete
    }

    /// Returns the concrete type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.concrete.type_name
    }

    /// Returns `true` if objects of this type can be viewed as `key`.
    #[must_use]
    pub fn can_be_viewed_as(&self, key: TypeKey) -> bool {
        self.views.iter().any(|view| view.key == key)
    }

    /// Casts an object of this type to the view `U`.
    ///
    /// Returns `None` if `U` is not a declared view or `object` is not of
    /// the concrete type.
    #[must_use]
    pub fn cast<U: ?Sized + 'static>(&self, object: AnyObject) -> Option<Arc<U>> {
        let key = TypeKey::of::<U>();
        let view = self.views.iter().find(|view| view.key == key)?;
        let boxed = (view.cast)(object)?;
        boxed.downcast::<Arc<U>>().ok().map(|arc| *arc)
    }

    /// Returns the names of all declared views, concrete type first.
    #[must_use]
    pub fn view_names(&self) -> Vec<&'static str> {
        self.views.iter().map(|view| view.key.type_name).collect()
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("concrete", &self.concrete)
            .field("views", &self.view_names())
            .finish()
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.concrete.type_name)
    }
}

/// Typed builder for a [`ModelType`] with concrete type `T`.
pub struct ModelTypeBuilder<T> {
    views: Vec<View>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ModelTypeBuilder<T> {
    /// Declares that objects can be viewed as `U` through `cast`.
    #[must_use]
    pub fn viewable_as<U: ?Sized + 'static>(
        mut self,
        cast: impl Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    ) -> Self {
        let key = TypeKey::of::<U>();
        if !self.views.iter().any(|view| view.key == key) {
            self.views.push(View {
                key,
                cast: erase_cast(cast),
            });
        }
        self
    }

    /// Finishes the model type.
    #[must_use]
    pub fn build(self) -> ModelType {
        ModelType {
            concrete: TypeKey::of::<T>(),
            views: self.views,
        }
    }
}

impl<T: Send + Sync + 'static> From<ModelTypeBuilder<T>> for ModelType {
    fn from(builder: ModelTypeBuilder<T>) -> Self {
        builder.build()
    }
}

fn erase_cast<T, U>(cast: impl Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static) -> ViewCast
where
    T: Send + Sync + 'static,
    U: ?Sized + 'static,
{
    Arc::new(move |object: AnyObject| -> Option<Box<dyn Any>> {
        let concrete = object.downcast::<T>().ok()?;
        Some(Box::new(cast(concrete)))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// ObjectFactory
// ─────────────────────────────────────────────────────────────────────────────

/// Creates instances for managed projections.
pub trait ObjectFactory: Send + Sync {
    /// Creates a new instance of the concrete type of `model_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Instantiation`] if no instance can be created.
    fn create(&self, model_type: &ModelType) -> Result<AnyObject>;
}

/// An [`ObjectFactory`] backed by constructors registered per type.
#[derive(Default)]
pub struct DefaultObjectFactory {
    constructors: HashMap<TypeId, Supplier>,
}

impl DefaultObjectFactory {
    /// Creates a factory with no constructors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor for `T`, replacing any previous one.
    pub fn register<T, F>(&mut self, constructor: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructors.insert(
            TypeId::of::<T>(),
            Arc::new(move || -> Result<AnyObject> { Ok(Arc::new(constructor())) }),
        );
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<T, F>(mut self, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(constructor);
        self
    }

    /// Registers `T::default` as the constructor for `T`.
    #[must_use]
    pub fn with_default<T: Default + Send + Sync + 'static>(self) -> Self {
        self.with(T::default)
    }
}

impl ObjectFactory for DefaultObjectFactory {
    fn create(&self, model_type: &ModelType) -> Result<AnyObject> {
        let constructor = self
            .constructors
            .get(&model_type.concrete().type_id)
            .ok_or_else(|| ModelError::Instantiation {
                type_name: model_type.type_name(),
                reason: "no constructor registered".to_string(),
            })?;
        constructor()
    }
}

impl fmt::Debug for DefaultObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultObjectFactory")
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModelProjection
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of a [`ModelProjection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    /// A single pre-built instance.
    Fixed,
    /// Built on first use and cached.
    Memoizing,
    /// Built on every use.
    Transient,
    /// Built by an object factory once bound.
    Managed,
}

enum Source {
    Fixed(AnyObject),
    Memoizing {
        supplier: Supplier,
        cache: Mutex<Option<AnyObject>>,
    },
    Transient(Supplier),
    Managed {
        binding: Option<Supplier>,
        cache: Mutex<Option<AnyObject>>,
    },
}

/// A view of a node as objects of a declared [`ModelType`].
pub struct ModelProjection {
    model_type: ModelType,
    source: Source,
}

impl ModelProjection {
    /// Projects a single instance of `T`.
    #[must_use]
    pub fn fixed<T: Send + Sync + 'static>(value: T) -> Self {
        Self::fixed_with(ModelType::builder::<T>(), value)
    }

    /// Projects a single instance with declared views.
    #[must_use]
    pub fn fixed_with<T: Send + Sync + 'static>(model_type: ModelTypeBuilder<T>, value: T) -> Self {
        Self {
            model_type: model_type.build(),
            source: Source::Fixed(Arc::new(value)),
        }
    }

    /// Projects an instance of `T` built on first use.
    #[must_use]
    pub fn memoizing<T, F>(supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::memoizing_with(ModelType::builder::<T>(), supplier)
    }

    /// Memoizing projection with declared views.
    #[must_use]
    pub fn memoizing_with<T, F>(model_type: ModelTypeBuilder<T>, supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            model_type: model_type.build(),
            source: Source::Memoizing {
                supplier: erase_supplier(supplier),
                cache: Mutex::new(None),
            },
        }
    }

    /// Projects a fresh instance of `T` on every use.
    #[must_use]
    pub fn transient<T, F>(supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::transient_with(ModelType::builder::<T>(), supplier)
    }

    /// Transient projection with declared views.
    #[must_use]
    pub fn transient_with<T, F>(model_type: ModelTypeBuilder<T>, supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            model_type: model_type.build(),
            source: Source::Transient(erase_supplier(supplier)),
        }
    }

    /// Declares a `T` whose instance is created by an object factory.
    #[must_use]
    pub fn managed<T: Send + Sync + 'static>() -> Self {
        Self::managed_with(ModelType::builder::<T>())
    }

    /// Managed projection with declared views.
    #[must_use]
    pub fn managed_with<T: Send + Sync + 'static>(model_type: ModelTypeBuilder<T>) -> Self {
        Self {
            model_type: model_type.build(),
            source: Source::Managed {
                binding: None,
                cache: Mutex::new(None),
            },
        }
    }

    /// Returns the declared model type.
    #[must_use]
    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    /// Returns the projection kind.
    #[must_use]
    pub fn kind(&self) -> ProjectionKind {
        match self.source {
            Source::Fixed(_) => ProjectionKind::Fixed,
            Source::Memoizing { .. } => ProjectionKind::Memoizing,
            Source::Transient(_) => ProjectionKind::Transient,
            Source::Managed { .. } => ProjectionKind::Managed,
        }
    }

    /// Returns `false` only for a managed projection that has not been
    /// bound yet.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !matches!(self.source, Source::Managed { binding: None, .. })
    }

    /// Binds a managed projection to `factory`.
    ///
    /// Returns `false` (and does nothing) for other kinds or when already
    /// bound.
    pub fn bind(&mut self, factory: Arc<dyn ObjectFactory>) -> bool {
        let Source::Managed { binding, .. } = &mut self.source else {
            return false;
        };
        if binding.is_some() {
            return false;
        }
        let model_type = self.model_type.clone();
        *binding = Some(Arc::new(move || factory.create(&model_type)));
        true
    }

    /// Returns `true` if the declared type, bound or not, can be viewed as
    /// `key`.
    #[must_use]
    pub fn declares(&self, key: TypeKey) -> bool {
        self.model_type.can_be_viewed_as(key)
    }

    /// Returns `true` if this projection can produce a view as `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnresolvedProjection`] for an unbound managed
    /// projection.
    pub fn can_be_viewed_as(&self, key: TypeKey) -> Result<bool> {
        self.ensure_bound()?;
        Ok(self.declares(key))
    }

    /// Produces the underlying object, building it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnresolvedProjection`] for an unbound managed
    /// projection, or whatever the supplier fails with.
    pub fn resolve(&self) -> Result<AnyObject> {
        match &self.source {
            Source::Fixed(instance) => Ok(Arc::clone(instance)),
            Source::Transient(supplier) => supplier(),
            Source::Memoizing { supplier, cache } => memoize(supplier, cache),
            Source::Managed {
                binding: Some(supplier),
                cache,
            } => memoize(supplier, cache),
            Source::Managed { binding: None, .. } => Err(self.unresolved()),
        }
    }

    /// Produces a view as `U`, or `None` if the declared type has no such
    /// view.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn get<U: ?Sized + 'static>(&self) -> Result<Option<Arc<U>>> {
        if !self.can_be_viewed_as(TypeKey::of::<U>())? {
            return Ok(None);
        }
        let object = self.resolve()?;
        Ok(self.model_type.cast::<U>(object))
    }

    fn ensure_bound(&self) -> Result<()> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(self.unresolved())
        }
    }

    fn unresolved(&self) -> ModelError {
        ModelError::UnresolvedProjection {
            type_name: self.model_type.type_name(),
        }
    }
}

impl fmt::Debug for ModelProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProjection")
            .field("kind", &self.kind())
            .field("model_type", &self.model_type)
            .finish()
    }
}

fn erase_supplier<T, F>(supplier: F) -> Supplier
where
    T: Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Arc::new(move || -> Result<AnyObject> { Ok(Arc::new(supplier())) })
}

fn memoize(supplier: &Supplier, cache: &Mutex<Option<AnyObject>>) -> Result<AnyObject> {
    let mut cache = cache.lock();
    if let Some(object) = cache.as_ref() {
        return Ok(Arc::clone(object));
    }
    let object = supplier()?;
    *cache = Some(Arc::clone(&object));
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    trait Named: Send + Sync {
        fn name(&self) -> String;
    }

    #[derive(Debug, Default)]
    struct Library {
        name: String,
    }

    impl Named for Library {
        fn name(&self) -> String {
            self.name.clone()
        }
    }

    fn library_type() -> ModelTypeBuilder<Library> {
        ModelType::builder::<Library>().viewable_as(|it| it as Arc<dyn Named>)
    }

    #[test]
    fn fixed_returns_the_same_instance() {
        let projection = ModelProjection::fixed(Library { name: "a".into() });
        let first = projection.get::<Library>().unwrap().unwrap();
        let second = projection.get::<Library>().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(projection.kind(), ProjectionKind::Fixed);
    }

    #[test]
    fn views_share_the_underlying_instance() {
        let projection = ModelProjection::fixed_with(library_type(), Library { name: "a".into() });
        let concrete = projection.get::<Library>().unwrap().unwrap();
        let named = projection.get::<dyn Named>().unwrap().unwrap();

        assert_eq!(named.name(), "a");
        assert_eq!(
            Arc::as_ptr(&concrete).cast::<()>(),
            Arc::as_ptr(&named).cast::<()>()
        );
    }

    #[test]
    fn undeclared_views_are_none() {
        let projection = ModelProjection::fixed(Library::default());
        assert!(projection.get::<dyn Named>().unwrap().is_none());
        assert!(!projection.declares(TypeKey::of::<String>()));
    }

    #[test]
    fn memoizing_builds_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let projection = ModelProjection::memoizing(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Library::default()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let first = projection.get::<Library>().unwrap().unwrap();
        let second = projection.get::<Library>().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_builds_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let projection = ModelProjection::transient_with(library_type(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Library::default()
        });

        let first = projection.get::<dyn Named>().unwrap().unwrap();
        let second = projection.get::<dyn Named>().unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unbound_managed_projection_is_unresolved() {
        let projection = ModelProjection::managed::<Library>();
        assert!(!projection.is_bound());
        assert!(projection.declares(TypeKey::of::<Library>()));
        assert!(matches!(
            projection.can_be_viewed_as(TypeKey::of::<Library>()),
            Err(ModelError::UnresolvedProjection { .. })
        ));
        assert!(matches!(
            projection.get::<Library>(),
            Err(ModelError::UnresolvedProjection { .. })
        ));
    }

    #[test]
    fn bound_managed_projection_memoizes() {
        let factory = Arc::new(DefaultObjectFactory::new().with(|| Library {
            name: "managed".into(),
        }));
        let mut projection = ModelProjection::managed_with(library_type());

        assert!(projection.bind(factory.clone()));
        assert!(!projection.bind(factory));

        let first = projection.get::<dyn Named>().unwrap().unwrap();
        let second = projection.get::<Library>().unwrap().unwrap();
        assert_eq!(first.name(), "managed");
        assert_eq!(
            Arc::as_ptr(&first).cast::<()>(),
            Arc::as_ptr(&second).cast::<()>()
        );
    }

    #[test]
    fn factory_without_constructor_fails() {
        let mut projection = ModelProjection::managed::<Library>();
        projection.bind(Arc::new(DefaultObjectFactory::new()));
        assert!(matches!(
            projection.resolve(),
            Err(ModelError::Instantiation { .. })
        ));
    }

    #[test]
    fn binding_other_kinds_is_a_no_op() {
        let mut projection = ModelProjection::fixed(Library::default());
        assert!(!projection.bind(Arc::new(DefaultObjectFactory::new().with_default::<Library>())));
    }
}

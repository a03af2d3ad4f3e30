//! Plugins bundle rules and configuration applied to a registry.

use crate::registry::ModelRegistry;
use arbor_model::Result;
use core::any::TypeId;

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A reusable bundle of rules.
///
/// Each plugin type is applied at most once per registry, after all of its
/// dependencies.
///
/// # Example
///
/// ```
/// use arbor_model::prelude::*;
/// use arbor_registry::prelude::*;
///
/// #[derive(Debug, Clone)]
/// struct Optimize(bool);
/// impl Component for Optimize {}
///
/// struct ReleasePlugin;
///
/// impl Plugin for ReleasePlugin {
///     fn apply(&self, registry: &mut ModelRegistry) -> Result<()> {
///         registry.register_rule(
///             ModelSpec::fully_qualified_name("release"),
///             ModelAction::new("optimize_release", |registry, node| {
///                 registry.add_component(node, Optimize(true))
///             }),
///         )?;
///         Ok(())
///     }
/// }
///
/// let mut registry = ModelRegistry::new();
/// assert!(registry.apply_plugin(ReleasePlugin).unwrap());
/// assert!(!registry.apply_plugin(ReleasePlugin).unwrap());
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// Registers the plugin's rules with `registry`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while registering rules or running the
    /// rules they trigger.
    fn apply(&self, registry: &mut ModelRegistry) -> Result<()>;

    /// Plugins that must be applied before this one.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }
}

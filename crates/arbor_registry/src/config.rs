//! Registry configuration.

use arbor_model::projection::ObjectFactory;
use core::fmt;
use std::sync::Arc;

/// What happens when a tag is added to a node that already carries it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagPolicy {
    /// Re-adding a present tag is a no-op.
    #[default]
    Idempotent,
    /// Re-adding a present tag fails like any other duplicate component.
    Strict,
}

/// Configuration for a [`ModelRegistry`](crate::registry::ModelRegistry).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use arbor_model::projection::DefaultObjectFactory;
/// use arbor_registry::config::{RegistryConfig, TagPolicy};
///
/// let config = RegistryConfig::new()
///     .tag_policy(TagPolicy::Strict)
///     .object_factory(Arc::new(DefaultObjectFactory::new()))
///     .max_pass_len(Some(10_000));
/// assert!(config.naming_enabled());
/// ```
#[derive(Clone)]
pub struct RegistryConfig {
    tag_policy: TagPolicy,
    naming: bool,
    object_factory: Option<Arc<dyn ObjectFactory>>,
    max_pass_len: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tag_policy: TagPolicy::default(),
            naming: true,
            object_factory: None,
            max_pass_len: None,
        }
    }
}

impl RegistryConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how duplicate tags are handled.
    #[must_use]
    pub fn tag_policy(mut self, policy: TagPolicy) -> Self {
        self.tag_policy = policy;
        self
    }

    /// Enables or disables the built-in naming rules.
    #[must_use]
    pub fn with_naming(mut self, enabled: bool) -> Self {
        self.naming = enabled;
        self
    }

    /// Sets the factory that managed projections are bound to.
    #[must_use]
    pub fn object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.object_factory = Some(factory);
        self
    }

    /// Caps the number of rule executions in a single pass.
    #[must_use]
    pub fn max_pass_len(mut self, limit: Option<usize>) -> Self {
        self.max_pass_len = limit;
        self
    }

    /// Returns the tag policy.
    #[must_use]
    pub fn get_tag_policy(&self) -> TagPolicy {
        self.tag_policy
    }

    /// Returns `true` if the naming rules are installed.
    #[must_use]
    pub fn naming_enabled(&self) -> bool {
        self.naming
    }

    /// Returns the configured object factory.
    #[must_use]
    pub fn get_object_factory(&self) -> Option<&Arc<dyn ObjectFactory>> {
        self.object_factory.as_ref()
    }

    /// Returns the pass length cap.
    #[must_use]
    pub fn get_max_pass_len(&self) -> Option<usize> {
        self.max_pass_len
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("tag_policy", &self.tag_policy)
            .field("naming", &self.naming)
            .field("object_factory", &self.object_factory.is_some())
            .field("max_pass_len", &self.max_pass_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.get_tag_policy(), TagPolicy::Idempotent);
        assert!(config.naming_enabled());
        assert!(config.get_object_factory().is_none());
        assert_eq!(config.get_max_pass_len(), None);
    }

    #[test]
    fn builder_overrides() {
        let config = RegistryConfig::new()
            .tag_policy(TagPolicy::Strict)
            .with_naming(false)
            .max_pass_len(Some(3));
        assert_eq!(config.get_tag_policy(), TagPolicy::Strict);
        assert!(!config.naming_enabled());
        assert_eq!(config.get_max_pass_len(), Some(3));
    }
}

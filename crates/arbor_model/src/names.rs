//! Element names and the naming components derived from them.
//!
//! Nodes declare their own [`ElementNameComponent`] and [`ParentComponent`];
//! the registry derives [`AncestorsComponent`],
//! [`FullyQualifiedNameComponent`] and [`RelativeNamesComponent`] from those.

use crate::component::Component;
use crate::error::{ModelError, Result};
use crate::id::NodeId;
use core::fmt;

/// The name of a single element, such as `main` or `debug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementName(String);

impl ElementName {
    /// Creates an element name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::InvalidName {
                name,
                reason: "element names must not be empty",
            });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Joins names outermost first, capitalizing every name after the first.
///
/// ```
/// use arbor_model::names::camel_join;
///
/// assert_eq!(camel_join(["main", "debug", "shared"]), "mainDebugShared");
/// ```
pub fn camel_join<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut joined = String::new();
    for name in names {
        if joined.is_empty() {
            joined.push_str(name);
            continue;
        }
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            joined.extend(first.to_uppercase());
            joined.push_str(chars.as_str());
        }
    }
    joined
}

/// The element name a node was registered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNameComponent(pub ElementName);

impl Component for ElementNameComponent {
    fn is_identity(&self) -> bool {
        true
    }
}

/// The node's parent. Parents are shared references into the registry
/// arena, never owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentComponent(pub NodeId);

impl Component for ParentComponent {
    fn is_identity(&self) -> bool {
        true
    }
}

/// Derived: every ancestor of the node, outermost first, excluding the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorsComponent(pub Vec<NodeId>);

impl AncestorsComponent {
    /// Returns `true` if `node` is one of the ancestors.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }
}

impl Component for AncestorsComponent {
    fn is_identity(&self) -> bool {
        true
    }
}

/// Derived: the camel-cased join of the element names from the outermost
/// named ancestor down to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullyQualifiedNameComponent(pub String);

impl FullyQualifiedNameComponent {
    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Component for FullyQualifiedNameComponent {
    fn is_identity(&self) -> bool {
        true
    }
}

/// The name of a node as seen from one of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeName {
    /// The ancestor the name is relative to.
    pub ancestor: NodeId,
    /// The camel-cased join of the names below the ancestor.
    pub name: String,
}

/// Derived: the node's name relative to each of its ancestors, outermost
/// ancestor first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeNamesComponent(pub Vec<RelativeName>);

impl RelativeNamesComponent {
    /// Returns the name relative to `ancestor`.
    #[must_use]
    pub fn get(&self, ancestor: NodeId) -> Option<&str> {
        self.0
            .iter()
            .find(|relative| relative.ancestor == ancestor)
            .map(|relative| relative.name.as_str())
    }
}

impl Component for RelativeNamesComponent {
    fn is_identity(&self) -> bool {
        true
    }
}

//! Error taxonomy shared by every layer of the model graph.
//!
//! Node-scoped variants carry the node's display string (its path when it
//! was registered with one, otherwise `node_<n>`) so that messages can be
//! read without access to the registry that produced them.

use core::fmt;

/// Convenience alias for results produced by model operations.
pub type Result<T, E = ModelError> = core::result::Result<T, E>;

/// Errors raised by model graph operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A component of the same type is already attached to the node.
    #[error("{node} already has a component of type {component}")]
    DuplicateComponent {
        /// Display of the node.
        node: String,
        /// Type name of the duplicated component.
        component: &'static str,
    },

    /// The requested component is not attached to the node.
    #[error("{node} has no component of type {component}")]
    MissingComponent {
        /// Display of the node.
        node: String,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// A managed projection was used before being bound to an object factory.
    #[error("managed projection of {type_name} is not bound to an object factory")]
    UnresolvedProjection {
        /// Type name of the managed object.
        type_name: &'static str,
    },

    /// No projection of the node can be viewed as the requested type.
    #[error("{node} cannot be viewed as {requested}; available projections: {available}")]
    TypeMismatch {
        /// Display of the node.
        node: String,
        /// Type name that was requested.
        requested: &'static str,
        /// Description of the node's declared projection types.
        available: String,
    },

    /// The operation is not legal in the node's current state.
    #[error("illegal state for {node}: {reason}")]
    IllegalState {
        /// Display of the node.
        node: String,
        /// What went wrong.
        reason: String,
    },

    /// A parent reference names a node or path that is not registered.
    #[error("parent {parent} of {node} is not registered")]
    UnknownParent {
        /// Display of the child node or path.
        node: String,
        /// Display of the missing parent.
        parent: String,
    },

    /// An explicit parent disagrees with the node at the parent path.
    #[error("{node} names {parent} as its parent, but its path places it under {path_parent}")]
    ConflictingParent {
        /// Display of the child path.
        node: String,
        /// Display of the explicit parent.
        parent: String,
        /// Display of the node at the parent path.
        path_parent: String,
    },

    /// Setting the parent would make the node its own ancestor.
    #[error("making {parent} the parent of {node} would create a cycle")]
    CyclicParent {
        /// Display of the child node.
        node: String,
        /// Display of the proposed parent.
        parent: String,
    },

    /// The node id does not belong to this registry.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// An element is already registered at the path.
    #[error("an element is already registered at '{0}'")]
    DuplicatePath(String),

    /// No element is registered at the path.
    #[error("no element is registered at '{0}'")]
    UnknownPath(String),

    /// A predicate is malformed.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// An element name or path segment is malformed.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An object factory could not create an instance.
    #[error("could not create an instance of {type_name}: {reason}")]
    Instantiation {
        /// Type name of the requested object.
        type_name: &'static str,
        /// Why creation failed.
        reason: String,
    },

    /// A plugin was applied before one of its dependencies.
    #[error("plugin {plugin} requires {dependency} to be applied first")]
    MissingPlugin {
        /// Type name of the plugin being applied.
        plugin: &'static str,
        /// Type name of the missing dependency.
        dependency: &'static str,
    },

    /// A user action failed.
    #[error("action failed: {0}")]
    Action(#[source] Box<dyn core::error::Error + Send + Sync>),
}

impl ModelError {
    /// Wraps an arbitrary error raised from inside a rule action.
    pub fn action(err: impl Into<Box<dyn core::error::Error + Send + Sync>>) -> Self {
        Self::Action(err.into())
    }

    /// Builds an [`IllegalState`](Self::IllegalState) error for `node`.
    pub fn illegal_state(node: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::IllegalState {
            node: node.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_embed_node_display() {
        let err = ModelError::MissingComponent {
            node: "app.main".into(),
            component: "ElementNameComponent",
        };
        assert_eq!(
            err.to_string(),
            "app.main has no component of type ElementNameComponent"
        );
    }

    #[test]
    fn action_wraps_string_errors() {
        let err = ModelError::action("boom");
        assert_eq!(err.to_string(), "action failed: boom");
        assert!(core::error::Error::source(&err).is_some());
    }
}

//! Node predicates used to select which nodes a rule applies to.
//!
//! A [`ModelSpec`] is a pure function of a single node snapshot. Apart
//! from the naming variants, every variant is monotone under the
//! registry's mutation rules: once a node satisfies a spec it keeps
//! satisfying it, because components are only ever added, identity
//! components are write-once and lifecycle states only move forward.
//! Derived names are recomputed when a late parent or element name
//! arrives, so `HasAncestor`, `RelativeName` and `FullyQualifiedName`
//! can start matching a node again later. Each rule still fires at most
//! once per node.
//!
//! # Example
//!
//! ```
//! use arbor_model::prelude::*;
//! use arbor_registry::spec::ModelSpec;
//!
//! #[derive(Debug)]
//! struct Executable;
//!
//! let spec = ModelSpec::subtype_of::<Executable>()
//!     .and(ModelSpec::state_at_least(ModelState::Realized));
//! assert!(spec.to_string().ends_with("and stateAtLeast(realized)"));
//! ```

use crate::node::ModelNode;
use arbor_model::component::{Component, ComponentId, ModelTag};
use arbor_model::path::ModelPath;
use arbor_model::projection::TypeKey;
use arbor_model::state::ModelState;
use arbor_model::{ModelError, NodeId, Result};
use core::fmt;
use std::sync::Arc;

/// A predicate over a node's snapshot.
#[derive(Clone, Default)]
pub enum ModelSpec {
    /// Matches every node.
    #[default]
    Always,
    /// A component of this type, or one declaring it as a capability, is
    /// attached. Tags are matched through their [`ComponentId`].
    Has(ComponentId),
    /// A component is attached and equal to a given value.
    Equals(ComponentMatch),
    /// The node's state is at least the given state.
    StateAtLeast(ModelState),
    /// The node is exactly this node.
    SelfIs(NodeId),
    /// The node's direct parent is this node.
    OwnedBy(NodeId),
    /// The node's derived ancestors include this node.
    HasAncestor(NodeId),
    /// The node's derived name relative to `ancestor` equals `name`.
    RelativeName {
        /// The ancestor the name is relative to.
        ancestor: NodeId,
        /// The expected relative name.
        name: String,
    },
    /// The node's derived fully-qualified name equals this name.
    FullyQualifiedName(String),
    /// Some projection of the node declares a view as this type.
    SubtypeOf(TypeKey),
    /// The node was registered at exactly this path.
    Path(ModelPath),
    /// The node was registered at a path strictly below this one.
    DescendantOf(ModelPath),
    /// An arbitrary pure predicate.
    Matching(NodePredicate),
    /// Every sub-spec matches.
    And(Vec<ModelSpec>),
}

/// Compares an attached component against an expected value.
#[derive(Clone)]
pub struct ComponentMatch {
    component: ComponentId,
    expected: String,
    test: Arc<dyn Fn(&dyn Component) -> bool + Send + Sync>,
}

impl ComponentMatch {
    /// Returns the id of the compared component type.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    fn matches(&self, node: &ModelNode) -> bool {
        node.components()
            .get_by_id(self.component)
            .is_some_and(|value| (self.test)(value))
    }
}

/// A named closure over a node snapshot.
///
/// The closure must be pure: it may only read the node it is given.
#[derive(Clone)]
pub struct NodePredicate {
    description: String,
    test: Arc<dyn Fn(&ModelNode) -> bool + Send + Sync>,
}

impl ModelSpec {
    /// Matches nodes carrying a component of type `T`.
    #[must_use]
    pub fn has<T: Component>() -> Self {
        ModelSpec::Has(ComponentId::of::<T>())
    }

    /// Matches nodes carrying tag `T`, or a tag implying it.
    #[must_use]
    pub fn has_tag<T: ModelTag>() -> Self {
        ModelSpec::Has(ComponentId::of_tag::<T>())
    }

    /// Matches nodes carrying a `T` equal to `value`.
    #[must_use]
    pub fn equals<T: Component + PartialEq>(value: T) -> Self {
        let expected = format!("{value:?}");
        ModelSpec::Equals(ComponentMatch {
            component: ComponentId::of::<T>(),
            expected,
            test: Arc::new(move |candidate| candidate.downcast_ref::<T>() == Some(&value)),
        })
    }

    /// Matches nodes whose state is at least `state`.
    #[must_use]
    pub fn state_at_least(state: ModelState) -> Self {
        ModelSpec::StateAtLeast(state)
    }

    /// Matches exactly `node`.
    #[must_use]
    pub fn self_is(node: NodeId) -> Self {
        ModelSpec::SelfIs(node)
    }

    /// Matches the direct children of `parent`.
    #[must_use]
    pub fn owned_by(parent: NodeId) -> Self {
        ModelSpec::OwnedBy(parent)
    }

    /// Matches every descendant of `ancestor`.
    #[must_use]
    pub fn has_ancestor(ancestor: NodeId) -> Self {
        ModelSpec::HasAncestor(ancestor)
    }

    /// Matches nodes named `name` relative to `ancestor`.
    #[must_use]
    pub fn relative_name(ancestor: NodeId, name: impl Into<String>) -> Self {
        ModelSpec::RelativeName {
            ancestor,
            name: name.into(),
        }
    }

    /// Matches nodes with fully-qualified name `name`.
    #[must_use]
    pub fn fully_qualified_name(name: impl Into<String>) -> Self {
        ModelSpec::FullyQualifiedName(name.into())
    }

    /// Matches nodes that can be viewed as `T`.
    #[must_use]
    pub fn subtype_of<T: ?Sized + 'static>() -> Self {
        ModelSpec::SubtypeOf(TypeKey::of::<T>())
    }

    /// Matches the node registered at `path`.
    #[must_use]
    pub fn path(path: ModelPath) -> Self {
        ModelSpec::Path(path)
    }

    /// Matches nodes registered below `path`.
    #[must_use]
    pub fn descendant_of(path: ModelPath) -> Self {
        ModelSpec::DescendantOf(path)
    }

    /// Matches nodes accepted by a pure closure.
    #[must_use]
    pub fn matching(
        description: impl Into<String>,
        test: impl Fn(&ModelNode) -> bool + Send + Sync + 'static,
    ) -> Self {
        ModelSpec::Matching(NodePredicate {
            description: description.into(),
            test: Arc::new(test),
        })
    }

    /// Conjunction of `self` and `other`.
    ///
    /// Nested conjunctions are flattened and `Always` is dropped.
    #[must_use]
    pub fn and(self, other: ModelSpec) -> Self {
        let mut specs = Vec::new();
        for spec in [self, other] {
            match spec {
                ModelSpec::Always => {}
                ModelSpec::And(inner) => specs.extend(inner),
                spec => specs.push(spec),
            }
        }
        match specs.len() {
            0 => ModelSpec::Always,
            1 => specs.remove(0),
            _ => ModelSpec::And(specs),
        }
    }

    /// Evaluates the spec against a node snapshot.
    #[must_use]
    pub fn is_satisfied_by(&self, node: &ModelNode) -> bool {
        match self {
            ModelSpec::Always => true,
            ModelSpec::Has(component) => node.has_component(*component),
            ModelSpec::Equals(matcher) => matcher.matches(node),
            ModelSpec::StateAtLeast(state) => node.state().is_at_least(*state),
            ModelSpec::SelfIs(id) => node.id() == *id,
            ModelSpec::OwnedBy(parent) => node.parent() == Some(*parent),
            ModelSpec::HasAncestor(ancestor) => node
                .ancestors()
                .is_some_and(|ancestors| ancestors.contains(ancestor)),
            ModelSpec::RelativeName { ancestor, name } => {
                node.relative_name(*ancestor) == Some(name.as_str())
            }
            ModelSpec::FullyQualifiedName(name) => {
                node.fully_qualified_name() == Some(name.as_str())
            }
            ModelSpec::SubtypeOf(key) => node.declares(*key),
            ModelSpec::Path(path) => node.path() == Some(path),
            ModelSpec::DescendantOf(path) => node
                .path()
                .is_some_and(|candidate| candidate.is_descendant_of(path)),
            ModelSpec::Matching(predicate) => (predicate.test)(node),
            ModelSpec::And(specs) => specs.iter().all(|spec| spec.is_satisfied_by(node)),
        }
    }

    /// Checks the spec is well formed for a registry holding `node_count`
    /// nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSpec`] for an empty conjunction, a
    /// reference to an unknown node, or an empty name.
    pub fn validate(&self, node_count: usize) -> Result<()> {
        let known = |node: &NodeId| {
            if node.index() < node_count {
                Ok(())
            } else {
                Err(ModelError::InvalidSpec(format!("{self} references unknown {node}")))
            }
        };
        let named = |name: &str| {
            if name.is_empty() {
                Err(ModelError::InvalidSpec(format!("{self} matches an empty name")))
            } else {
                Ok(())
            }
        };
        match self {
            ModelSpec::SelfIs(node) | ModelSpec::OwnedBy(node) | ModelSpec::HasAncestor(node) => {
                known(node)
            }
            ModelSpec::RelativeName { ancestor, name } => {
                known(ancestor)?;
                named(name)
            }
            ModelSpec::FullyQualifiedName(name) => named(name),
            ModelSpec::And(specs) if specs.is_empty() => Err(ModelError::InvalidSpec(
                "a conjunction needs at least one spec".to_string(),
            )),
            ModelSpec::And(specs) => specs.iter().try_for_each(|spec| spec.validate(node_count)),
            ModelSpec::Always
            | ModelSpec::Has(_)
            | ModelSpec::Equals(_)
            | ModelSpec::StateAtLeast(_)
            | ModelSpec::SubtypeOf(_)
            | ModelSpec::Path(_)
            | ModelSpec::DescendantOf(_)
            | ModelSpec::Matching(_) => Ok(()),
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Always => f.write_str("always"),
            ModelSpec::Has(component) => write!(f, "has({component})"),
            ModelSpec::Equals(matcher) => {
                write!(f, "equals({}: {})", matcher.component, matcher.expected)
            }
            ModelSpec::StateAtLeast(state) => write!(f, "stateAtLeast({state})"),
            ModelSpec::SelfIs(node) => write!(f, "self({node})"),
            ModelSpec::OwnedBy(node) => write!(f, "ownedBy({node})"),
            ModelSpec::HasAncestor(node) => write!(f, "hasAncestor({node})"),
            ModelSpec::RelativeName { ancestor, name } => {
                write!(f, "relativeName({ancestor}, {name})")
            }
            ModelSpec::FullyQualifiedName(name) => write!(f, "fullyQualifiedName({name})"),
            ModelSpec::SubtypeOf(key) => write!(f, "subtypeOf({})", key.type_name()),
            ModelSpec::Path(path) => write!(f, "path({path})"),
            ModelSpec::DescendantOf(path) => write!(f, "descendantOf({path})"),
            ModelSpec::Matching(predicate) => write!(f, "matching({})", predicate.description),
            ModelSpec::And(specs) => {
                for (index, spec) in specs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "{spec}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelSpec({self})")
    }
}

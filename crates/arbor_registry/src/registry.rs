//! The model registry: owner of every node and rule.
//!
//! [`ModelRegistry`] is the single entry point for mutating the model
//! graph. Every mutation is reported to the rule engine (see
//! [`configurer`](crate::configurer)), and when called from outside a rule
//! action it also drains the resulting work before returning.
//!
//! # Example
//!
//! ```
//! use arbor_model::prelude::*;
//! use arbor_registry::prelude::*;
//!
//! let mut registry = ModelRegistry::new();
//! let root = registry.register_node(ModelRegistration::builder().build()).unwrap();
//! let a = registry
//!     .register_node(ModelRegistration::builder().parent(root).element_name("a").build())
//!     .unwrap();
//! let b = registry
//!     .register_node(ModelRegistration::builder().parent(a).element_name("b").build())
//!     .unwrap();
//!
//! assert_eq!(registry.ancestors(b).unwrap(), vec![root, a]);
//! assert_eq!(registry.fully_qualified_name(b).unwrap(), "aB");
//! assert_eq!(registry.relative_name(b, a).unwrap().as_deref(), Some("b"));
//! ```

use crate::action::ModelAction;
use crate::config::{RegistryConfig, TagPolicy};
use crate::configurer::{Configurer, Rule, RuleId};
use crate::naming;
use crate::node::ModelNode;
use crate::owners::ObjectOwners;
use crate::plugin::{Plugin, PluginId};
use crate::registration::ModelRegistration;
use crate::spec::ModelSpec;
use arbor_model::component::{Component, ComponentId, ModelTag, tag};
use arbor_model::names::{
    ElementName, ElementNameComponent, FullyQualifiedNameComponent, ParentComponent,
    RelativeNamesComponent,
};
use arbor_model::path::ModelPath;
use arbor_model::projection::{ModelProjection, TypeKey};
use arbor_model::state::ModelState;
use arbor_model::{ModelError, NodeId, Result};
use core::fmt;
use core::marker::PhantomData;
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Arena of model nodes plus the rules evaluated against them.
pub struct ModelRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) nodes: Vec<ModelNode>,
    pub(crate) configurer: Configurer,
    paths: HashMap<ModelPath, NodeId>,
    owners: ObjectOwners,
    plugins: HashSet<PluginId>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Creates a registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates a registry with `config`.
    ///
    /// The naming rules are installed first unless disabled, so they always
    /// run before user rules.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let mut registry = Self {
            config,
            nodes: Vec::new(),
            configurer: Configurer::default(),
            paths: HashMap::new(),
            owners: ObjectOwners::default(),
            plugins: HashSet::new(),
        };
        if registry.config.naming_enabled() {
            for (spec, action) in naming::rules() {
                registry.configurer.add_rule(spec, action);
            }
            registry.plugins.insert(PluginId::of::<naming::NamingPlugin>());
        }
        registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a node in the `Registered` state and runs every rule it
    /// matches.
    ///
    /// # Errors
    ///
    /// - [`ModelError::DuplicatePath`] if the path is taken
    /// - [`ModelError::UnknownParent`] if the parent path or parent node is
    ///   not registered
    /// - [`ModelError::ConflictingParent`] if an explicit parent differs from
    ///   the node at the parent path
    /// - [`ModelError::InvalidName`] for an empty element name
    /// - [`ModelError::DuplicateComponent`] if two components share a type
    /// - any error raised by the rules the node triggers; the node stays
    ///   registered in that case
    pub fn register_node(&mut self, registration: ModelRegistration) -> Result<NodeId> {
        let ModelRegistration {
            path,
            element_name,
            components,
            projections,
        } = registration;

        let id = NodeId::new(self.nodes.len());
        let mut node = ModelNode::new(id, path.clone());

        if let Some(path) = &path
            && self.paths.contains_key(path)
        {
            return Err(ModelError::DuplicatePath(path.to_string()));
        }
        let path_parent = match path.as_ref().and_then(ModelPath::parent) {
            Some(parent_path) => Some(self.paths.get(&parent_path).copied().ok_or_else(|| {
                ModelError::UnknownParent {
                    node: node.to_string(),
                    parent: parent_path.to_string(),
                }
            })?),
            None => None,
        };

        for component in components {
            self.insert_new(&mut node, component)?;
        }
        if let Some(name) = element_name {
            let name = ElementName::new(name)?;
            self.insert_new(&mut node, Box::new(ElementNameComponent(name)))?;
        } else if let Some(path) = &path
            && !node.has::<ElementNameComponent>()
        {
            let name = ElementName::new(path.name())?;
            node.components_mut().insert(ElementNameComponent(name));
        }
        match (node.parent(), path_parent) {
            (Some(parent), path_parent) => {
                if parent.index() >= self.nodes.len() {
                    return Err(ModelError::UnknownParent {
                        node: node.to_string(),
                        parent: parent.to_string(),
                    });
                }
                if let Some(path_parent) = path_parent
                    && path_parent != parent
                {
                    return Err(ModelError::ConflictingParent {
                        node: node.to_string(),
                        parent: self.display(parent),
                        path_parent: self.display(path_parent),
                    });
                }
            }
            (None, Some(parent)) => {
                node.components_mut().insert(ParentComponent(parent));
            }
            (None, None) => {}
        }

        for mut projection in projections {
            if let Some(factory) = self.config.get_object_factory() {
                projection.bind(Arc::clone(factory));
            }
            node.push_projection(projection);
        }

        debug!(
            node = %node,
            components = node.components().len(),
            projections = node.projections().len(),
            "node registered"
        );
        if let Some(path) = path {
            self.paths.insert(path, id);
        }
        self.nodes.push(node);
        self.configurer.track_node(id);
        self.configurer.schedule_node(&self.nodes[id.index()]);
        self.drain()?;
        Ok(id)
    }

    /// Registers a rule and runs it against every existing node it matches,
    /// in node registration order.
    ///
    /// The action's declared inputs are added to `spec` as `has`
    /// requirements.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSpec`] for a malformed spec, or any
    /// error raised by the rules that run.
    pub fn register_rule(&mut self, spec: ModelSpec, action: ModelAction) -> Result<RuleId> {
        spec.validate(self.nodes.len())?;
        let id = self.configurer.add_rule(spec, action);
        if let Some(rule) = self.configurer.rules().get(id.index()) {
            debug!(rule = %rule.action().name(), spec = %rule.spec(), "rule registered");
        }
        self.configurer.schedule_rule(id, &self.nodes);
        self.drain()?;
        Ok(id)
    }

    /// Runs `action` against every realized node viewable as `T`.
    ///
    /// # Errors
    ///
    /// Same as [`register_rule`](Self::register_rule).
    pub fn configure_each<T, F>(&mut self, name: impl Into<String>, action: F) -> Result<RuleId>
    where
        T: ?Sized + 'static,
        F: Fn(&mut ModelRegistry, NodeId, Arc<T>) -> Result<()> + Send + Sync + 'static,
    {
        self.register_rule(
            ModelSpec::subtype_of::<T>().and(ModelSpec::state_at_least(ModelState::Realized)),
            ModelAction::new(name, move |registry, node| {
                let object = registry.view::<T>(node)?;
                action(registry, node, object)
            }),
        )
    }

    /// Runs `action` against the realized node viewable as `T` whose
    /// fully-qualified name is `name`.
    ///
    /// # Errors
    ///
    /// Same as [`register_rule`](Self::register_rule).
    pub fn configure_named<T, F>(&mut self, name: impl Into<String>, action: F) -> Result<RuleId>
    where
        T: ?Sized + 'static,
        F: Fn(&mut ModelRegistry, NodeId, Arc<T>) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        self.register_rule(
            ModelSpec::fully_qualified_name(name.clone())
                .and(ModelSpec::subtype_of::<T>())
                .and(ModelSpec::state_at_least(ModelState::Realized)),
            ModelAction::new(format!("configure {name}"), move |registry, node| {
                let object = registry.view::<T>(node)?;
                action(registry, node, object)
            }),
        )
    }

    /// Runs `action` as soon as a node viewable as `T` is registered,
    /// without realizing it.
    ///
    /// Realizing the element from inside `action` changes the state of the
    /// node the rule runs against and therefore fails; keep the handle and
    /// realize it later instead.
    ///
    /// # Errors
    ///
    /// Same as [`register_rule`](Self::register_rule).
    pub fn when_element_known<T, F>(&mut self, name: impl Into<String>, action: F) -> Result<RuleId>
    where
        T: ?Sized + 'static,
        F: Fn(&mut ModelRegistry, KnownElement<T>) -> Result<()> + Send + Sync + 'static,
    {
        self.register_rule(
            ModelSpec::subtype_of::<T>(),
            ModelAction::new(name, move |registry, node| {
                action(registry, KnownElement::new(node))
            }),
        )
    }

    /// Applies `plugin` unless a plugin of the same type was applied
    /// before.
    ///
    /// Returns `true` if the plugin was applied by this call.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingPlugin`] if a dependency has not been
    /// applied, or any error raised by the plugin.
    pub fn apply_plugin<P: Plugin>(&mut self, plugin: P) -> Result<bool> {
        let id = PluginId::of::<P>();
        if self.plugins.contains(&id) {
            return Ok(false);
        }
        if let Some(missing) = plugin
            .dependencies()
            .into_iter()
            .find(|dependency| !self.plugins.contains(dependency))
        {
            return Err(ModelError::MissingPlugin {
                plugin: id.type_name(),
                dependency: missing.type_name(),
            });
        }
        plugin.apply(self)?;
        self.plugins.insert(id);
        debug!(plugin = id.type_name(), "plugin applied");
        Ok(true)
    }

    /// Returns `true` if plugin `P` has been applied.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugins.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Attaches a component to `node`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::DuplicateComponent`] if a value of the same type is
    ///   attached (tags follow the configured [`TagPolicy`])
    /// - [`ModelError::UnknownParent`] or [`ModelError::CyclicParent`] for a
    ///   bad [`ParentComponent`]
    /// - [`ModelError::IllegalState`] when a parent or element name would
    ///   change the derived names of the node a rule is running against
    ///
    /// A late parent or element name recomputes the names already derived
    /// for the node and its descendants.
    pub fn add_component<T: Component>(&mut self, node: NodeId, value: T) -> Result<()> {
        self.add_boxed_component(node, Box::new(value))
    }

    /// Attaches tag `T` to `node`.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn add_tag<T: ModelTag>(&mut self, node: NodeId) -> Result<()> {
        self.add_component(node, tag::<T>())
    }

    /// Type-erased form of [`add_component`](Self::add_component).
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn add_boxed_component(&mut self, node: NodeId, value: Box<dyn Component>) -> Result<()> {
        let index = self.index_of(node)?;
        let id = ComponentId::of_val(value.as_ref());
        if self.nodes[index].components().contains(id) {
            if value.is_tag() && self.config.get_tag_policy() == TagPolicy::Idempotent {
                return Ok(());
            }
            return Err(ModelError::DuplicateComponent {
                node: self.display(node),
                component: id.type_name(),
            });
        }
        if let Some(parent) = value.downcast_ref::<ParentComponent>() {
            self.check_parent(node, parent.0)?;
        }
        let renames = id == ComponentId::of::<ParentComponent>()
            || id == ComponentId::of::<ElementNameComponent>();

        debug!(node = %self.display(node), component = id.type_name(), "component added");
        self.nodes[index].components_mut().insert_boxed(value);
        let refreshed = if renames {
            match self.refresh_derived_names(node, id) {
                Ok(refreshed) => refreshed,
                Err(err) => {
                    self.nodes[index].components_mut().remove(id);
                    return Err(err);
                }
            }
        } else {
            Vec::new()
        };
        self.configurer.schedule_node(&self.nodes[index]);
        for other in refreshed.into_iter().filter(|other| *other != node) {
            self.configurer.schedule_node(&self.nodes[other.index()]);
        }
        self.drain()
    }

    /// Attaches `value` to `node`, replacing a previous value of the same
    /// type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IllegalState`] if the replaced value is an
    /// identity component, and otherwise the errors of
    /// [`add_component`](Self::add_component).
    pub fn set_component<T: Component>(&mut self, node: NodeId, value: T) -> Result<()> {
        let index = self.index_of(node)?;
        let id = ComponentId::of::<T>();
        let existing_identity = self.nodes[index]
            .components()
            .get_by_id(id)
            .map(Component::is_identity);
        match existing_identity {
            None => self.add_component(node, value),
            Some(identity) if identity || value.is_identity() => {
                Err(self.identity_violation(node, format!("replaced {}", id.type_name())))
            }
            Some(_) => {
                debug!(node = %self.display(node), component = id.type_name(), "component replaced");
                self.nodes[index].components_mut().insert(value);
                self.configurer.schedule_node(&self.nodes[index]);
                self.drain()
            }
        }
    }

    /// Adds a projection to `node`, binding it to the configured object
    /// factory when it is managed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IllegalState`] when called from a rule running
    /// against `node`, since it changes what the node can be viewed as.
    pub fn add_projection(&mut self, node: NodeId, mut projection: ModelProjection) -> Result<()> {
        let index = self.index_of(node)?;
        self.ensure_not_executing(node, || {
            format!("added a projection of {}", projection.model_type())
        })?;
        if let Some(factory) = self.config.get_object_factory() {
            projection.bind(Arc::clone(factory));
        }
        debug!(node = %self.display(node), model_type = %projection.model_type(), "projection added");
        self.nodes[index].push_projection(projection);
        self.configurer.schedule_node(&self.nodes[index]);
        self.drain()
    }

    /// Advances `node` to `target`, stepping through every intermediate
    /// state and running the rules each step enables.
    ///
    /// The parent is advanced first: to `Discovered` for any target past
    /// `Registered`, and to `Realized` when the target is `Realized`. If a
    /// rule is running against the parent, its advance waits until that
    /// rule returns. A target at or before the current state is a no-op.
    ///
    /// Returns the node's state afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IllegalState`] when called from a rule running
    /// against `node`, or any error raised by the rules that run.
    pub fn transition(&mut self, node: NodeId, target: ModelState) -> Result<ModelState> {
        let index = self.index_of(node)?;
        if self.nodes[index].state() >= target {
            return Ok(self.nodes[index].state());
        }
        if let Some(parent) = self.nodes[index].parent() {
            let parent_target = if target == ModelState::Realized {
                ModelState::Realized
            } else {
                ModelState::Discovered
            };
            if self.is_executing(parent) {
                debug!(
                    node = %self.display(parent),
                    state = %parent_target,
                    "parent advance deferred"
                );
                self.configurer.defer_transition(parent, parent_target);
            } else {
                self.transition(parent, parent_target)?;
            }
        }
        while let Some(next) = self.nodes[index].state().next()
            && next <= target
        {
            self.ensure_not_executing(node, || format!("moved to {next}"))?;
            self.nodes[index].set_state(next)?;
            debug!(node = %self.display(node), state = %next, "state advanced");
            self.configurer.schedule_node(&self.nodes[index]);
            self.drain()?;
        }
        Ok(self.nodes[index].state())
    }

    /// Realizes `node` and returns its object viewed as `T`.
    ///
    /// The first projection declaring `T` wins. The returned object is
    /// recorded so that [`owner_of`](Self::owner_of) can find `node` again.
    ///
    /// # Errors
    ///
    /// - [`ModelError::TypeMismatch`] if no projection declares `T`
    /// - [`ModelError::UnresolvedProjection`] if it is an unbound managed
    ///   projection
    /// - any error from realizing the node
    pub fn view<T: ?Sized + 'static>(&mut self, node: NodeId) -> Result<Arc<T>> {
        self.transition(node, ModelState::Realized)?;
        let index = self.index_of(node)?;
        let key = TypeKey::of::<T>();
        let target = &self.nodes[index];
        let Some(projection) = target
            .projections()
            .iter()
            .find(|projection| projection.declares(key))
        else {
            return Err(type_mismatch::<T>(target));
        };
        let object = projection.resolve()?;
        self.owners.record(&object, node);
        projection
            .model_type()
            .cast::<T>(object)
            .ok_or_else(|| type_mismatch::<T>(target))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Returns the node with id `node`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] for an id from another registry.
    pub fn node(&self, node: NodeId) -> Result<&ModelNode> {
        self.nodes
            .get(node.index())
            .ok_or_else(|| ModelError::UnknownNode(node.to_string()))
    }

    /// Iterates over all nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &ModelNode> {
        self.nodes.iter()
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the ids of all nodes matching `spec`, in registration order.
    #[must_use]
    pub fn query(&self, spec: &ModelSpec) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| spec.is_satisfied_by(node))
            .map(ModelNode::id)
            .collect()
    }

    /// Returns `true` if any node matches `spec`.
    #[must_use]
    pub fn any_match(&self, spec: &ModelSpec) -> bool {
        self.nodes.iter().any(|node| spec.is_satisfied_by(node))
    }

    /// Returns the state of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] for an unknown id.
    pub fn state(&self, node: NodeId) -> Result<ModelState> {
        Ok(self.node(node)?.state())
    }

    /// Returns the component of type `T` attached to `node`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingComponent`] if it is not attached.
    pub fn get_component<T: Component>(&self, node: NodeId) -> Result<&T> {
        self.node(node)?.get::<T>()
    }

    /// Returns the component of type `T` attached to `node`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] for an unknown id.
    pub fn find_component<T: Component>(&self, node: NodeId) -> Result<Option<&T>> {
        Ok(self.node(node)?.find::<T>())
    }

    /// Returns `true` if `node` has a component of type `T`, or one
    /// declaring `T` as a capability.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] for an unknown id.
    pub fn has_component<T: Component>(&self, node: NodeId) -> Result<bool> {
        Ok(self.node(node)?.has::<T>())
    }

    /// Returns `true` if some projection of `node` declares a view as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnresolvedProjection`] if the first such
    /// projection is an unbound managed projection.
    pub fn can_be_viewed_as<T: ?Sized + 'static>(&self, node: NodeId) -> Result<bool> {
        let key = TypeKey::of::<T>();
        match self
            .node(node)?
            .projections()
            .iter()
            .find(|projection| projection.declares(key))
        {
            Some(projection) => projection.can_be_viewed_as(key),
            None => Ok(false),
        }
    }

    /// Returns the node that produced `object` through [`view`](Self::view).
    ///
    /// Any view of the object works, including trait-object views.
    #[must_use]
    pub fn owner_of<T: ?Sized>(&self, object: &Arc<T>) -> Option<NodeId> {
        self.owners.owner_of(object)
    }

    /// Returns the node registered at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownPath`] if nothing is registered there.
    pub fn get_path(&self, path: &ModelPath) -> Result<NodeId> {
        self.find_path(path)
            .ok_or_else(|| ModelError::UnknownPath(path.to_string()))
    }

    /// Returns the node registered at `path`, if any.
    #[must_use]
    pub fn find_path(&self, path: &ModelPath) -> Option<NodeId> {
        self.paths.get(path).copied()
    }

    /// Returns `true` if a node is registered at `path`.
    #[must_use]
    pub fn has_path(&self, path: &ModelPath) -> bool {
        self.paths.contains_key(path)
    }

    /// Returns the ancestors of `node`, outermost first, excluding `node`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] for an unknown id.
    pub fn ancestors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut ancestors = Vec::new();
        let mut current = self.node(node)?.parent();
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.node(parent)?.parent();
        }
        ancestors.reverse();
        Ok(ancestors)
    }

    /// Returns the derived fully-qualified name of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingComponent`] if the node has no element
    /// name or naming is disabled.
    pub fn fully_qualified_name(&self, node: NodeId) -> Result<&str> {
        let node = self.node(node)?;
        node.get::<FullyQualifiedNameComponent>()
            .map(FullyQualifiedNameComponent::as_str)
    }

    /// Returns the derived name of `node` relative to `ancestor`, or `None`
    /// if `ancestor` is not one of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingComponent`] if the node has no parent,
    /// no element name, or naming is disabled.
    pub fn relative_name(&self, node: NodeId, ancestor: NodeId) -> Result<Option<String>> {
        let names = self.node(node)?.get::<RelativeNamesComponent>()?;
        Ok(names.get(ancestor).map(str::to_string))
    }

    /// Returns the registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Arc<Rule>] {
        self.configurer.rules()
    }

    /// Returns the number of registered rules, including built-in ones.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.configurer.rules().len()
    }

    /// Returns `true` once `rule` has been scheduled against `node`.
    #[must_use]
    pub fn is_scheduled(&self, rule: RuleId, node: NodeId) -> bool {
        self.configurer.is_scheduled(rule, node)
    }

    /// Returns the number of rules queued but not yet run.
    #[must_use]
    pub fn pending_rules(&self) -> usize {
        self.configurer.pending()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn index_of(&self, node: NodeId) -> Result<usize> {
        if node.index() < self.nodes.len() {
            Ok(node.index())
        } else {
            Err(ModelError::UnknownNode(node.to_string()))
        }
    }

    pub(crate) fn display(&self, node: NodeId) -> String {
        self.nodes
            .get(node.index())
            .map_or_else(|| node.to_string(), ToString::to_string)
    }

    /// Inserts a component into a node that is not registered yet.
    fn insert_new(&self, node: &mut ModelNode, value: Box<dyn Component>) -> Result<()> {
        let is_tag = value.is_tag();
        match node.components_mut().try_insert_boxed(value) {
            Ok(()) => Ok(()),
            Err(_) if is_tag && self.config.get_tag_policy() == TagPolicy::Idempotent => Ok(()),
            Err(rejected) => Err(ModelError::DuplicateComponent {
                node: node.to_string(),
                component: rejected.component_name(),
            }),
        }
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes.get(node.index()).and_then(ModelNode::parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(parent.index()).and_then(ModelNode::parent);
        }
        false
    }

    fn check_parent(&self, node: NodeId, parent: NodeId) -> Result<()> {
        if parent.index() >= self.nodes.len() {
            return Err(ModelError::UnknownParent {
                node: self.display(node),
                parent: parent.to_string(),
            });
        }
        if parent == node || self.is_descendant(parent, node) {
            return Err(ModelError::CyclicParent {
                node: self.display(node),
                parent: self.display(parent),
            });
        }
        Ok(())
    }

    /// Recomputes the names already derived for `node` and its
    /// descendants after `added` changed their parent chain.
    ///
    /// Returns the nodes whose names changed, in registration order.
    fn refresh_derived_names(&mut self, node: NodeId, added: ComponentId) -> Result<Vec<NodeId>> {
        let mut stale = Vec::new();
        for candidate in &self.nodes {
            let id = candidate.id();
            if !candidate.has_derived_names() || (id != node && !self.is_descendant(id, node)) {
                continue;
            }
            let derived = naming::derive(self, id)?;
            if derived.is_stale_on(candidate) {
                self.ensure_not_executing(id, || {
                    format!("names recomputed after adding {}", added.type_name())
                })?;
                stale.push((id, derived));
            }
        }
        let mut refreshed = Vec::with_capacity(stale.len());
        for (id, derived) in stale {
            derived.replace_on(&mut self.nodes[id.index()]);
            debug!(node = %self.display(id), "derived names recomputed");
            refreshed.push(id);
        }
        Ok(refreshed)
    }

    fn is_executing(&self, node: NodeId) -> bool {
        self.configurer
            .executing()
            .is_some_and(|(executing, _)| executing == node)
    }

    fn ensure_not_executing(&self, node: NodeId, change: impl FnOnce() -> String) -> Result<()> {
        match self.configurer.executing() {
            Some((executing, rule)) if executing == node => Err(ModelError::illegal_state(
                self.display(node),
                format!(
                    "identity changed ({}) while rule '{}' was running against it",
                    change(),
                    rule.action().name()
                ),
            )),
            _ => Ok(()),
        }
    }

    fn identity_violation(&self, node: NodeId, change: String) -> ModelError {
        match self.configurer.executing() {
            Some((executing, rule)) if executing == node => ModelError::illegal_state(
                self.display(node),
                format!(
                    "identity changed ({change}) while rule '{}' was running against it",
                    rule.action().name()
                ),
            ),
            _ => ModelError::illegal_state(
                self.display(node),
                format!("identity components are write-once ({change})"),
            ),
        }
    }
}

fn type_mismatch<T: ?Sized + 'static>(node: &ModelNode) -> ModelError {
    ModelError::TypeMismatch {
        node: node.to_string(),
        requested: core::any::type_name::<T>(),
        available: node.projection_types(),
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("nodes", &self.nodes.len())
            .field("rules", &self.configurer.rules().len())
            .field("plugins", &self.plugins.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Handle to a registered element that may not be realized yet.
pub struct KnownElement<T: ?Sized> {
    node: NodeId,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + 'static> KnownElement<T> {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// Returns the element's node.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Realizes the element and returns its object.
    ///
    /// # Errors
    ///
    /// Same as [`ModelRegistry::view`].
    pub fn realize(&self, registry: &mut ModelRegistry) -> Result<Arc<T>> {
        registry.view::<T>(self.node)
    }
}

impl<T: ?Sized> Clone for KnownElement<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for KnownElement<T> {}

impl<T: ?Sized> fmt::Debug for KnownElement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnownElement")
            .field("node", &self.node)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}

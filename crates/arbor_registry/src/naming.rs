//! Built-in rules deriving ancestors and names.
//!
//! | Rule | Requires | Derives |
//! |------|----------|---------|
//! | `derive_ancestors` | [`ParentComponent`] | [`AncestorsComponent`] |
//! | `derive_fully_qualified_name` | [`ElementNameComponent`] | [`FullyQualifiedNameComponent`] |
//! | `derive_relative_names` | both | [`RelativeNamesComponent`] |
//!
//! Names are joined outermost first with [`camel_join`]; ancestors without
//! an element name are skipped. The rules derive each component once. When
//! a parent or element name arrives later, the registry recomputes the
//! components already derived for the node and its descendants with
//! the same derivation, so derived names never go stale.

use crate::action::ModelAction;
use crate::node::ModelNode;
use crate::plugin::Plugin;
use crate::registry::ModelRegistry;
use crate::spec::ModelSpec;
use arbor_model::component::{Component, ComponentId};
use arbor_model::names::{
    AncestorsComponent, ElementNameComponent, FullyQualifiedNameComponent, ParentComponent,
    RelativeName, RelativeNamesComponent, camel_join,
};
use arbor_model::{NodeId, Result};

/// Installs the naming rules.
///
/// Registries install it on creation unless built with
/// [`RegistryConfig::with_naming(false)`](crate::config::RegistryConfig::with_naming),
/// so applying it again is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingPlugin;

impl Plugin for NamingPlugin {
    fn apply(&self, registry: &mut ModelRegistry) -> Result<()> {
        for (spec, action) in rules() {
            registry.register_rule(spec, action)?;
        }
        Ok(())
    }
}

pub(crate) fn rules() -> Vec<(ModelSpec, ModelAction)> {
    vec![
        (
            ModelSpec::Always,
            ModelAction::with_input("derive_ancestors", derive_ancestors),
        ),
        (
            ModelSpec::Always,
            ModelAction::with_input("derive_fully_qualified_name", derive_fully_qualified_name),
        ),
        (
            ModelSpec::Always,
            ModelAction::with_inputs2("derive_relative_names", derive_relative_names),
        ),
    ]
}

fn derive_ancestors(registry: &mut ModelRegistry, node: NodeId, _: ParentComponent) -> Result<()> {
    let ancestors = registry.ancestors(node)?;
    registry.add_component(node, AncestorsComponent(ancestors))
}

fn derive_fully_qualified_name(
    registry: &mut ModelRegistry,
    node: NodeId,
    name: ElementNameComponent,
) -> Result<()> {
    let ancestors = registry.ancestors(node)?;
    let qualified = qualified_name(registry, &ancestors, name.0.as_str())?;
    registry.add_component(node, FullyQualifiedNameComponent(qualified))
}

fn derive_relative_names(
    registry: &mut ModelRegistry,
    node: NodeId,
    _: ParentComponent,
    name: ElementNameComponent,
) -> Result<()> {
    let ancestors = registry.ancestors(node)?;
    let relative = relative_names(registry, &ancestors, name.0.as_str())?;
    registry.add_component(node, RelativeNamesComponent(relative))
}

/// The naming components a node should carry given its current parent
/// chain. A component is `None` while its inputs are missing.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DerivedNames {
    pub(crate) ancestors: Option<AncestorsComponent>,
    pub(crate) qualified: Option<FullyQualifiedNameComponent>,
    pub(crate) relative: Option<RelativeNamesComponent>,
}

impl DerivedNames {
    /// Returns `true` if a component already attached to `node` differs
    /// from its recomputed value.
    pub(crate) fn is_stale_on(&self, node: &ModelNode) -> bool {
        differs(node.find(), self.ancestors.as_ref())
            || differs(node.find(), self.qualified.as_ref())
            || differs(node.find(), self.relative.as_ref())
    }

    /// Replaces the derived components attached to `node`. Absent ones are
    /// left to the naming rules.
    pub(crate) fn replace_on(self, node: &mut ModelNode) {
        replace(node, self.ancestors);
        replace(node, self.qualified);
        replace(node, self.relative);
    }
}

fn differs<T: PartialEq>(attached: Option<&T>, derived: Option<&T>) -> bool {
    attached.is_some() && attached != derived
}

fn replace<T: Component>(node: &mut ModelNode, derived: Option<T>) {
    if let Some(value) = derived
        && node.components().contains(ComponentId::of::<T>())
    {
        node.components_mut().insert(value);
    }
}

/// Computes every naming component of `node` from the current graph.
pub(crate) fn derive(registry: &ModelRegistry, node: NodeId) -> Result<DerivedNames> {
    let target = registry.node(node)?;
    let has_parent = target.parent().is_some();
    let ancestors = registry.ancestors(node)?;
    let mut derived = DerivedNames::default();
    if let Some(name) = target.element_name() {
        derived.qualified = Some(FullyQualifiedNameComponent(qualified_name(
            registry,
            &ancestors,
            name.as_str(),
        )?));
        if has_parent {
            derived.relative = Some(RelativeNamesComponent(relative_names(
                registry,
                &ancestors,
                name.as_str(),
            )?));
        }
    }
    if has_parent {
        derived.ancestors = Some(AncestorsComponent(ancestors));
    }
    Ok(derived)
}

fn qualified_name(registry: &ModelRegistry, ancestors: &[NodeId], name: &str) -> Result<String> {
    let names = element_names(registry, ancestors)?;
    Ok(camel_join(names.iter().map(String::as_str).chain([name])))
}

fn relative_names(
    registry: &ModelRegistry,
    ancestors: &[NodeId],
    name: &str,
) -> Result<Vec<RelativeName>> {
    let mut relative = Vec::with_capacity(ancestors.len());
    for (position, ancestor) in ancestors.iter().enumerate() {
        let below = element_names(registry, &ancestors[position + 1..])?;
        relative.push(RelativeName {
            ancestor: *ancestor,
            name: camel_join(below.iter().map(String::as_str).chain([name])),
        });
    }
    Ok(relative)
}

/// Element names of `nodes`, skipping unnamed ones.
fn element_names(registry: &ModelRegistry, nodes: &[NodeId]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for node in nodes {
        if let Some(name) = registry.node(*node)?.element_name() {
            names.push(name.as_str().to_string());
        }
    }
    Ok(names)
}

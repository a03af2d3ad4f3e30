//! Rule actions.
//!
//! An action is a named closure run once against each node its rule
//! matches. Actions receive the registry mutably and may register nodes and
//! rules or add components; work they trigger is queued behind the pass
//! that is currently draining rather than run re-entrantly.
//!
//! Actions can declare typed inputs. Each input adds a `has(I)`
//! requirement to the rule's spec and is cloned out of the node before the
//! closure runs:
//!
//! ```
//! use arbor_model::prelude::*;
//! use arbor_registry::action::ModelAction;
//!
//! #[derive(Debug, Clone)]
//! struct BaseName(String);
//! impl Component for BaseName {}
//!
//! let action = ModelAction::with_input("log_base_name", |_registry, node, base: BaseName| {
//!     tracing::info!(%node, base = %base.0, "configured");
//!     Ok(())
//! });
//! assert_eq!(action.inputs(), &[ComponentId::of::<BaseName>()]);
//! ```

use crate::registry::ModelRegistry;
use arbor_model::component::{Component, ComponentId};
use arbor_model::{NodeId, Result};
use core::fmt;
use std::sync::Arc;

type ActionFn = dyn Fn(&mut ModelRegistry, NodeId) -> Result<()> + Send + Sync;

/// A named closure executed against matching nodes.
#[derive(Clone)]
pub struct ModelAction {
    name: String,
    inputs: Vec<ComponentId>,
    run: Arc<ActionFn>,
}

impl ModelAction {
    /// Creates an action without declared inputs.
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut ModelRegistry, NodeId) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            run: Arc::new(action),
        }
    }

    /// Creates an action reading one input component.
    pub fn with_input<I, F>(name: impl Into<String>, action: F) -> Self
    where
        I: Component + Clone,
        F: Fn(&mut ModelRegistry, NodeId, I) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: vec![ComponentId::of::<I>()],
            run: Arc::new(move |registry: &mut ModelRegistry, node: NodeId| {
                let input = registry.get_component::<I>(node)?.clone();
                action(registry, node, input)
            }),
        }
    }

    /// Creates an action reading two input components.
    pub fn with_inputs2<I0, I1, F>(name: impl Into<String>, action: F) -> Self
    where
        I0: Component + Clone,
        I1: Component + Clone,
        F: Fn(&mut ModelRegistry, NodeId, I0, I1) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: vec![ComponentId::of::<I0>(), ComponentId::of::<I1>()],
            run: Arc::new(move |registry: &mut ModelRegistry, node: NodeId| {
                let first = registry.get_component::<I0>(node)?.clone();
                let second = registry.get_component::<I1>(node)?.clone();
                action(registry, node, first, second)
            }),
        }
    }

    /// Returns the action's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared input component types.
    #[must_use]
    pub fn inputs(&self) -> &[ComponentId] {
        &self.inputs
    }

    pub(crate) fn execute(&self, registry: &mut ModelRegistry, node: NodeId) -> Result<()> {
        (self.run)(registry, node)
    }
}

impl fmt::Debug for ModelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAction")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

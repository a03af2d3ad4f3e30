//! Model registry and rule-matching engine for Arbor (Layer 2).
//!
//! `arbor_registry` owns the model graph: an arena of [`ModelNode`]s and an
//! ordered list of rules, each pairing a [`ModelSpec`] with a
//! [`ModelAction`]. Every rule runs exactly once against every node it ever
//! matches, in a well-defined order.
//!
//! # Core Concepts
//!
//! - [`ModelRegistry`] - The facade through which nodes are registered,
//!   mutated, advanced through their lifecycle and viewed
//! - [`ModelSpec`] - Pure predicates over a node
//! - [`ModelAction`] - Named closures run against matching nodes
//! - [`Plugin`] - Bundles of rules; [`NamingPlugin`] derives names
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use arbor_model::prelude::*;
//! use arbor_registry::prelude::*;
//!
//! #[derive(Debug)]
//! struct Executable;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .configure_each::<Executable, _>("log_executables", |registry, node, _exe| {
//!         let name = registry.fully_qualified_name(node)?;
//!         tracing::info!(%node, name, "realized");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let app = registry
//!     .register_node(
//!         ModelRegistration::builder()
//!             .element_name("app")
//!             .projection(ModelProjection::fixed(Executable))
//!             .build(),
//!     )
//!     .unwrap();
//! let exe: Arc<Executable> = registry.view(app).unwrap();
//! assert_eq!(registry.owner_of(&exe), Some(app));
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 2 of Arbor:
//!
//! - **Layer 1** (`arbor_model`): Node data types
//! - **Layer 2** (`arbor_registry`): Registry and rule matching (this crate)
//! - **Layer 3** (`arbor_plugins`): Ambient plugins
//!
//! [`ModelNode`]: node::ModelNode
//! [`ModelSpec`]: spec::ModelSpec
//! [`ModelAction`]: action::ModelAction
//! [`ModelRegistry`]: registry::ModelRegistry
//! [`Plugin`]: plugin::Plugin
//! [`NamingPlugin`]: naming::NamingPlugin

/// Rule actions.
pub mod action;

/// Registry configuration.
pub mod config;

/// The rule-matching engine.
pub mod configurer;

/// Built-in naming rules.
pub mod naming;

/// Model nodes.
pub mod node;

mod owners;

/// Plugins.
pub mod plugin;

/// Node registrations.
pub mod registration;

/// The registry facade.
pub mod registry;

/// Node predicates.
pub mod spec;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::action::ModelAction;
    pub use crate::config::{RegistryConfig, TagPolicy};
    pub use crate::configurer::{Rule, RuleId};
    pub use crate::naming::NamingPlugin;
    pub use crate::node::ModelNode;
    pub use crate::plugin::{Plugin, PluginId};
    pub use crate::registration::{ModelRegistration, ModelRegistrationBuilder};
    pub use crate::registry::{KnownElement, ModelRegistry};
    pub use crate::spec::ModelSpec;
}

//! Layer 1 of Arbor: the data types of the model graph.
//!
//! This crate defines what a model node is made of, without the registry
//! that owns nodes and evaluates rules against them:
//!
//! - [`component`] - Typed components, tags and the per-node [`ComponentStore`]
//! - [`state`] - The four-state node lifecycle
//! - [`projection`] - Projections, model types and object factories
//! - [`path`] - Dotted model paths
//! - [`names`] - Element names and the derived naming components
//! - [`property`] - Settable, readable-later values
//! - [`error`] - The [`ModelError`] taxonomy
//!
//! # Architecture
//!
//! - **Layer 1** (`arbor_model`): Node data types
//! - **Layer 2** (`arbor_registry`): Registry, rule matching and naming
//! - **Layer 3** (`arbor_plugins`): Ambient plugins such as tracing
//!
//! [`ComponentStore`]: component::ComponentStore
//! [`ModelError`]: error::ModelError

pub mod component;
pub mod error;
pub mod id;
pub mod names;
pub mod path;
pub mod projection;
pub mod property;
pub mod state;

pub use error::{ModelError, Result};
pub use id::NodeId;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::component::{Component, ComponentId, ComponentStore, ModelTag, TagComponent, tag};
    pub use crate::error::{ModelError, Result};
    pub use crate::id::NodeId;
    pub use crate::names::{
        AncestorsComponent, ElementName, ElementNameComponent, FullyQualifiedNameComponent,
        ParentComponent, RelativeName, RelativeNamesComponent,
    };
    pub use crate::path::ModelPath;
    pub use crate::projection::{
        AnyObject, DefaultObjectFactory, ModelProjection, ModelType, ObjectFactory,
        ProjectionKind, TypeKey,
    };
    pub use crate::property::Property;
    pub use crate::state::ModelState;
}

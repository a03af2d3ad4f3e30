//! Ambient plugins for Arbor.
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//!
//! # Example
//!
//! ```
//! use arbor_plugins::{TracingFormat, TracingPlugin};
//! use arbor_registry::registry::ModelRegistry;
//! use tracing::Level;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .apply_plugin(TracingPlugin::default().with_level(Level::DEBUG).with_format(TracingFormat::Compact))
//!     .unwrap();
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 3 of Arbor:
//!
//! - **Layer 1** (`arbor_model`): Node data types
//! - **Layer 2** (`arbor_registry`): Registry and rule matching
//! - **Layer 3** (`arbor_plugins`): Ambient plugins (this crate)

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

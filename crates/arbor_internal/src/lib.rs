//! # Arbor Internal Library
//!
//! Re-exports the core Arbor crates for convenience.

/// Layer 1: Node data types.
pub use arbor_model;

/// Layer 2: Registry and rule matching.
pub use arbor_registry;

/// Layer 3: Ambient plugins.
pub use arbor_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use arbor_model::prelude::*;
    pub use arbor_plugins::{TracingConfig, TracingFormat, TracingPlugin};
    pub use arbor_registry::prelude::*;
}

//! A lazy, rule-driven model graph for build tooling.
//!

pub use arbor_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use arbor_internal::prelude::*;
}

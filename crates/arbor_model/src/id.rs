//! Node identifiers.

use core::fmt;

/// Identifies a node within a single registry.
///
/// Ids are dense arena indices handed out in registration order, so
/// comparing two ids also compares their registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates an id from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_index() {
        assert_eq!(NodeId::new(7).to_string(), "node_7");
    }

    #[test]
    fn ordering_follows_registration_order() {
        assert!(NodeId::new(1) < NodeId::new(2));
    }
}

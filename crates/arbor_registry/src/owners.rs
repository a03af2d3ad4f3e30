//! Back-references from projected objects to the nodes that produced them.

use arbor_model::NodeId;
use arbor_model::projection::AnyObject;
use core::any::Any;
use hashbrown::HashMap;
use std::sync::{Arc, Weak};

/// Weakly maps object addresses to their owning node.
///
/// An entry is only trusted while the recorded object is alive, so a
/// reused address never resolves to a stale owner.
#[derive(Debug, Default)]
pub(crate) struct ObjectOwners {
    owners: HashMap<usize, (Weak<dyn Any + Send + Sync>, NodeId)>,
}

impl ObjectOwners {
    pub(crate) fn record(&mut self, object: &AnyObject, node: NodeId) {
        if self.owners.len() >= 64 && self.owners.len().is_power_of_two() {
            self.owners.retain(|_, (weak, _)| weak.strong_count() > 0);
        }
        self.owners
            .insert(address(Arc::as_ptr(object)), (Arc::downgrade(object), node));
    }

    pub(crate) fn owner_of<T: ?Sized>(&self, object: &Arc<T>) -> Option<NodeId> {
        let (weak, node) = self.owners.get(&address(Arc::as_ptr(object)))?;
        (weak.strong_count() > 0).then_some(*node)
    }
}

fn address<T: ?Sized>(ptr: *const T) -> usize {
    ptr.cast::<()>().addr()
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {}
    struct Library;
    impl Named for Library {}

    #[test]
    fn resolves_any_view_of_a_recorded_object() {
        let mut owners = ObjectOwners::default();
        let object: AnyObject = Arc::new(Library);
        owners.record(&object, NodeId::new(2));

        let concrete = Arc::clone(&object).downcast::<Library>().unwrap();
        let named: Arc<dyn Named> = concrete.clone();
        assert_eq!(owners.owner_of(&concrete), Some(NodeId::new(2)));
        assert_eq!(owners.owner_of(&named), Some(NodeId::new(2)));
        assert_eq!(owners.owner_of(&Arc::new(Library)), None);
    }

    #[test]
    fn dropped_objects_have_no_owner() {
        let mut owners = ObjectOwners::default();
        let object: AnyObject = Arc::new(Library);
        owners.record(&object, NodeId::new(0));
        let probe = Arc::clone(&object);
        drop(object);
        assert_eq!(owners.owner_of(&probe), Some(NodeId::new(0)));
        drop(probe);
        assert!(owners.owners.values().all(|(weak, _)| weak.strong_count() == 0));
    }
}

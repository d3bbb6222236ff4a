//! Unbalanced binary search tree.

use crate::{
    raw::{Probe, RawTree},
    Engine, Key, Kind, Value,
};

/// A binary search tree without rebalancing.
///
/// Insertion attaches a new leaf at the first free slot on the search path. Removal uses the
/// transplant splice: a node with two children is replaced by the minimum of its right subtree.
#[derive(Clone, Debug, Default)]
pub struct BstTree {
    raw: RawTree<()>,
}

impl BstTree {
    /// Returns a new empty tree.
    pub const fn new() -> BstTree {
        BstTree {
            raw: RawTree::new(),
        }
    }
}

impl Engine for BstTree {
    type Meta = ();

    const KIND: Kind = Kind::Unbalanced;

    fn raw(&self) -> &RawTree<()> {
        &self.raw
    }

    /// Inserts `key`.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    fn insert(&mut self, key: Key, value: Value) -> bool {
        match self.raw.probe(key) {
            Probe::Occupied { node, .. } => {
                self.raw.set_value(node, value);
                false
            }
            Probe::Vacant(at) => {
                let node = self.raw.attach(at, key, value, ());
                tracing::debug!(target: "reactive_trees::bst", key, node = ?node, "inserted");
                true
            }
        }
    }

    fn remove(&mut self, key: Key) -> bool {
        let Some((node, _)) = self.raw.find(key) else {
            return false;
        };

        self.raw.unlink(node);
        tracing::debug!(target: "reactive_trees::bst", key, "removed");
        true
    }

    fn clear(&mut self) {
        self.raw.clear();
    }

    fn from_shape(shape: RawTree<()>) -> Self {
        BstTree { raw: shape }
    }

    fn assert_invariants(&self) {
        self.raw.assert_links();
    }
}

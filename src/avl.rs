//! Height-balanced (AVL) binary search tree.
//!
//! Every node caches its height: the number of nodes on the longest path from it down to a leaf,
//! with absent children counting 0. The balance factor of a node is
//! `height(left) - height(right)`, and the AVL invariant keeps it within `-1..=1` everywhere.
//!
//! After a leaf is attached or a node is unlinked, every ancestor on the path back to the root has
//! its height refreshed and is rebalanced, bottom-up:
//!
//! - Left-heavy (`> 1`): if the left child is not right-heavy, rotate right once; otherwise rotate
//!   the left child left, then the node right.
//! - Right-heavy (`< -1`): the mirror image.
//!
//! Cached heights make each step _O(1)_, so both insertion and removal run in _O(log(n))_.

use crate::{
    raw::{Link, Probe, RawTree},
    traverse::{self, Order},
    Dir, Engine, Key, Kind, NodeId, Value,
};

/// A height-balanced binary search tree.
#[derive(Clone, Debug, Default)]
pub struct AvlTree {
    raw: RawTree<u32>,
}

impl AvlTree {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree {
        AvlTree {
            raw: RawTree::new(),
        }
    }

    #[inline]
    fn height_of(&self, node: Link) -> u32 {
        node.map(|n| *self.raw.meta(n)).unwrap_or(0)
    }

    fn update_height(&mut self, node: NodeId) {
        let height = 1 + self
            .height_of(self.raw.left(node))
            .max(self.height_of(self.raw.right(node)));
        self.raw.set_meta(node, height);
    }

    fn balance_factor(&self, node: NodeId) -> i64 {
        let left = self.height_of(self.raw.left(node));
        let right = self.height_of(self.raw.right(node));
        i64::from(left) - i64::from(right)
    }

    // Rotates `down` towards `dir` and refreshes the two heights that change.
    fn rotate(&mut self, down: NodeId, dir: Dir) -> NodeId {
        let up = self.raw.rotate(down, dir);
        self.update_height(down);
        self.update_height(up);
        up
    }

    // Restores the balance of `node`, whose children are balanced and have correct heights.
    //
    // Returns the root of the rebalanced subtree.
    fn rebalance(&mut self, node: NodeId) -> NodeId {
        let bf = self.balance_factor(node);

        let heavy = if bf > 1 {
            Dir::Left
        } else if bf < -1 {
            Dir::Right
        } else {
            return node;
        };

        let child = self
            .raw
            .child(node, heavy)
            .expect("the heavy side of an unbalanced node is not empty");

        // The child leans the other way: the double-rotation case.
        let child_bf = self.balance_factor(child);
        let leans_inward = match heavy {
            Dir::Left => child_bf < 0,
            Dir::Right => child_bf > 0,
        };
        if leans_inward {
            self.rotate(child, heavy);
        }

        tracing::trace!(
            target: "reactive_trees::avl",
            key = self.raw.key(node),
            balance = bf,
            double = leans_inward,
            "rebalancing"
        );

        self.rotate(node, !heavy)
    }

    // Walks from `start` up to the root, refreshing heights and rebalancing every ancestor.
    fn retrace(&mut self, start: Link) {
        let mut cur = start;
        while let Some(node) = cur {
            self.update_height(node);
            let top = self.rebalance(node);
            cur = self.raw.parent(top);
        }
    }

    // Computes every height of a freshly parsed shape bottom-up. Returns `false` if some node is
    // out of balance.
    fn restore_heights(&mut self) -> bool {
        let mut balanced = true;
        for node in traverse::node_ids(&self.raw, Order::Post) {
            self.update_height(node);
            balanced &= self.balance_factor(node).abs() <= 1;
        }
        balanced
    }

    fn assert_invariants_at(&self, node: Link) -> u32 {
        let Some(node) = node else {
            return 0;
        };

        let left = self.assert_invariants_at(self.raw.left(node));
        let right = self.assert_invariants_at(self.raw.right(node));
        let height = 1 + left.max(right);

        assert_eq!(
            *self.raw.meta(node),
            height,
            "stale cached height at {}",
            self.raw.key(node)
        );
        assert!(
            left.abs_diff(right) <= 1,
            "node {} is out of balance ({left} vs {right})",
            self.raw.key(node)
        );

        height
    }
}

impl Engine for AvlTree {
    type Meta = u32;

    const KIND: Kind = Kind::Avl;

    fn raw(&self) -> &RawTree<u32> {
        &self.raw
    }

    /// Inserts `key`, then rebalances every ancestor of the new leaf.
    ///
    /// This operation completes in _O(log(n))_ time.
    fn insert(&mut self, key: Key, value: Value) -> bool {
        match self.raw.probe(key) {
            Probe::Occupied { node, .. } => {
                self.raw.set_value(node, value);
                false
            }
            Probe::Vacant(at) => {
                let node = self.raw.attach(at, key, value, 1);
                self.retrace(self.raw.parent(node));
                tracing::debug!(target: "reactive_trees::avl", key, "inserted");
                true
            }
        }
    }

    /// Removes `key`, then rebalances every ancestor of the unlinked node.
    ///
    /// A node with two children is not relocated: the key and value of its in-order successor are
    /// copied into it and the successor, which has no left child, is unlinked instead.
    ///
    /// This operation completes in _O(log(n))_ time.
    fn remove(&mut self, key: Key) -> bool {
        let Some((node, _)) = self.raw.find(key) else {
            return false;
        };

        let target = match (self.raw.left(node), self.raw.right(node)) {
            (Some(_), Some(right)) => {
                let successor = self.raw.min_in_subtree(right);
                let (succ_key, succ_value) = (self.raw.key(successor), self.raw.value(successor));
                self.raw.set_payload(node, succ_key, succ_value);
                successor
            }
            _ => node,
        };

        let parent = self.raw.unlink_unary(target);
        self.retrace(parent);
        tracing::debug!(target: "reactive_trees::avl", key, "removed");
        true
    }

    fn clear(&mut self) {
        self.raw.clear();
    }

    fn from_shape(shape: RawTree<u32>) -> Self {
        let mut tree = AvlTree { raw: shape };
        if tree.restore_heights() {
            return tree;
        }

        tracing::warn!(
            target: "reactive_trees::avl",
            len = tree.len(),
            "loaded shape is out of balance; rebuilding"
        );

        let mut rebuilt = AvlTree::new();
        for (key, value) in traverse::node_ids(&tree.raw, Order::Pre)
            .into_iter()
            .map(|node| (tree.raw.key(node), tree.raw.value(node)))
        {
            rebuilt.insert(key, value);
        }
        rebuilt
    }

    fn assert_invariants(&self) {
        self.raw.assert_links();
        self.assert_invariants_at(self.raw.root());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(keys: &[Key]) -> AvlTree {
        let mut tree = AvlTree::new();
        for &key in keys {
            assert!(tree.insert(key, key));
            tree.assert_invariants();
        }
        tree
    }

    #[test]
    fn balanced_input_needs_no_rotation() {
        let t = tree(&[50, 30, 70, 20, 40, 60, 80]);

        assert_eq!(t.inorder(), [20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(t.preorder(), [50, 30, 20, 40, 70, 60, 80]);
    }

    #[test]
    fn ascending_triggers_left_rotation() {
        let t = tree(&[10, 20, 30]);
        assert_eq!(t.preorder(), [20, 10, 30]);
        assert_eq!(t.height(), 2);
    }

    #[test]
    fn descending_triggers_right_rotation() {
        let t = tree(&[30, 20, 10]);
        assert_eq!(t.preorder(), [20, 10, 30]);
    }

    #[test]
    fn left_right_case() {
        let t = tree(&[30, 10, 20]);
        assert_eq!(t.preorder(), [20, 10, 30]);
    }

    #[test]
    fn right_left_case() {
        let t = tree(&[10, 30, 20]);
        assert_eq!(t.preorder(), [20, 10, 30]);
    }

    #[test]
    fn remove_copies_successor_payload() {
        let mut t = tree(&[20, 10, 30, 25, 40]);
        let root = t.raw.root();

        assert!(t.remove(20));
        t.assert_invariants();

        // The root node keeps its identity and now holds the successor.
        assert_eq!(t.raw.root(), root);
        assert_eq!(t.preorder(), [25, 10, 30, 40]);
    }

    #[test]
    fn remove_rebalances() {
        let mut t = tree(&[20, 10, 30, 40]);

        assert!(t.remove(10));
        t.assert_invariants();
        assert_eq!(t.preorder(), [30, 20, 40]);
    }

    #[test]
    fn ascending_run_stays_logarithmic() {
        let keys: Vec<Key> = (0..1024).collect();
        let t = tree(&keys);

        assert_eq!(t.height(), 11);
    }

    #[test]
    fn unbalanced_shape_is_rebuilt() {
        let t = AvlTree::deserialize("1 # 2 # 3 # #").unwrap();

        t.assert_invariants();
        assert_eq!(t.preorder(), [2, 1, 3]);
    }
}

//! Red-black binary search tree.
//!
//! The invariants, with absent children counting as black leaves:
//!
//! 1. A red node has no red child.
//! 2. Every path from a node down to an absent child passes through the same number of black
//!    nodes (the node's black-height).
//! 3. The root is black after every mutation.
//!
//! Insertion attaches a red leaf and repairs red-red violations upwards, with at most two
//! rotations. Removal splices out a node as in the unbalanced tree; if the physically removed
//! node was black, the "double black" deficit left at its replacement is pushed upwards or
//! resolved with at most three rotations.

use crate::{
    raw::{Link, Probe, RawTree},
    traverse::{self, Order},
    Color, Dir, Engine, Key, Kind, NodeId, Value,
};

/// A red-black binary search tree.
#[derive(Clone, Debug, Default)]
pub struct RbTree {
    raw: RawTree<Color>,
}

impl RbTree {
    /// Returns a new empty tree.
    pub const fn new() -> RbTree {
        RbTree {
            raw: RawTree::new(),
        }
    }

    /// Returns the color of the node holding `key`.
    pub fn color_of(&self, key: Key) -> Option<Color> {
        self.raw.find(key).map(|(node, _)| *self.raw.meta(node))
    }

    #[inline]
    fn color(&self, node: Link) -> Color {
        node.map(|n| *self.raw.meta(n)).unwrap_or(Color::Black)
    }

    #[inline]
    fn is_red(&self, node: Link) -> bool {
        self.color(node) == Color::Red
    }

    #[inline]
    fn set_color(&mut self, node: NodeId, color: Color) {
        self.raw.set_meta(node, color);
    }

    // Restores the invariants after `node` was attached as a red leaf.
    fn insert_fixup(&mut self, node: NodeId) {
        let mut z = node;

        while let Some(mut parent) = self.raw.parent(z).filter(|&p| self.is_red(Some(p))) {
            let grandparent = self
                .raw
                .parent(parent)
                .expect("a red node is never the root");
            let side = self.raw.which_child(grandparent, parent);
            let uncle = self.raw.child(grandparent, !side);

            match uncle.filter(|&u| self.is_red(Some(u))) {
                Some(uncle) => {
                    // Red uncle: push the blackness of the grandparent down one level.
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;

                    tracing::trace!(
                        target: "reactive_trees::rb",
                        key = self.raw.key(grandparent),
                        "insert fixup: recolored"
                    );
                }

                None => {
                    if self.raw.which_child(parent, z) == !side {
                        // Inner child: rotate it into the outer position first.
                        z = parent;
                        self.raw.rotate(z, side);
                        parent = self.raw.parent(z).expect("rotated node has a parent");
                    }

                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.raw.rotate(grandparent, !side);

                    tracing::trace!(
                        target: "reactive_trees::rb",
                        key = self.raw.key(parent),
                        "insert fixup: rotated"
                    );
                }
            }
        }

        if let Some(root) = self.raw.root() {
            self.set_color(root, Color::Black);
        }
    }

    // Resolves the missing black on the path through `x`, whose parent is `parent`.
    //
    // `x` may be absent, in which case `parent` tells which position it occupies.
    fn remove_fixup(&mut self, mut x: Link, mut parent: Link) {
        while x != self.raw.root() && !self.is_red(x) {
            let Some(p) = parent else { break };

            let side = if self.raw.left(p) == x {
                Dir::Left
            } else {
                Dir::Right
            };

            let mut sibling = self
                .raw
                .child(p, !side)
                .expect("a double-black node always has a sibling");

            if self.is_red(Some(sibling)) {
                // Red sibling: rotate it above the parent so the new sibling is black.
                self.set_color(sibling, Color::Black);
                self.set_color(p, Color::Red);
                self.raw.rotate(p, side);
                sibling = self
                    .raw
                    .child(p, !side)
                    .expect("a double-black node always has a sibling");
            }

            let near = self.raw.child(sibling, side);
            let far = self.raw.child(sibling, !side);

            if !self.is_red(near) && !self.is_red(far) {
                // Both nephews black: recolor the sibling and move the deficit up.
                self.set_color(sibling, Color::Red);
                x = Some(p);
                parent = self.raw.parent(p);

                tracing::trace!(
                    target: "reactive_trees::rb",
                    key = self.raw.key(p),
                    "remove fixup: moved deficit up"
                );
                continue;
            }

            if !self.is_red(far) {
                // Near nephew red, far nephew black: rotate the red one into the far position.
                let near = near.expect("red nephew exists");
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.raw.rotate(sibling, !side);
                sibling = self
                    .raw
                    .child(p, !side)
                    .expect("a double-black node always has a sibling");
            }

            let parent_color = self.color(Some(p));
            self.set_color(sibling, parent_color);
            self.set_color(p, Color::Black);
            if let Some(far) = self.raw.child(sibling, !side) {
                self.set_color(far, Color::Black);
            }
            self.raw.rotate(p, side);

            tracing::trace!(
                target: "reactive_trees::rb",
                key = self.raw.key(sibling),
                "remove fixup: resolved by rotation"
            );

            x = self.raw.root();
            parent = None;
        }

        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    // Colors a freshly parsed shape.
    //
    // Bottom-up, each node gets two bitsets of feasible black-heights: one for coloring it black,
    // one for red (absent children have black-height 0). Top-down, the root is colored black at
    // its smallest feasible height and every child prefers black when its required height allows
    // it. Returns `false` if no valid coloring exists.
    fn recolor(&mut self) -> bool {
        let Some(root) = self.raw.root() else {
            return true;
        };

        const ABSENT: (u64, u64) = (1, 0);

        // (black, red) feasibility per arena slot.
        let mut feasible = vec![(0u64, 0u64); self.raw.slots()];
        let lookup = |feasible: &[(u64, u64)], node: Link| match node {
            Some(n) => feasible[n.index()],
            None => ABSENT,
        };

        for node in traverse::node_ids(&self.raw, Order::Post) {
            let (lb, lr) = lookup(&feasible, self.raw.left(node));
            let (rb, rr) = lookup(&feasible, self.raw.right(node));

            let black = ((lb | lr) & (rb | rr)) << 1;
            let red = lb & rb;
            feasible[node.index()] = (black, red);
        }

        let root_black = feasible[root.index()].0;
        if root_black == 0 {
            return false;
        }

        let mut stack = vec![(root, Color::Black, root_black.trailing_zeros())];
        while let Some((node, color, height)) = stack.pop() {
            self.set_color(node, color);

            let child_height = match color {
                Color::Black => height - 1,
                Color::Red => height,
            };

            for child in [self.raw.left(node), self.raw.right(node)].into_iter().flatten() {
                let (black, _) = feasible[child.index()];
                let child_color = if black & (1 << child_height) != 0 {
                    Color::Black
                } else {
                    Color::Red
                };
                stack.push((child, child_color, child_height));
            }
        }

        true
    }

    // Returns the black-height of the subtree at `node`, panicking on any color violation.
    fn assert_invariants_at(&self, node: Link) -> usize {
        let Some(node) = node else {
            return 0;
        };

        let key = self.raw.key(node);
        if self.is_red(Some(node)) {
            assert!(
                !self.is_red(self.raw.left(node)) && !self.is_red(self.raw.right(node)),
                "red node {key} has a red child"
            );
        }

        let left = self.assert_invariants_at(self.raw.left(node));
        let right = self.assert_invariants_at(self.raw.right(node));
        assert_eq!(left, right, "black-heights differ below {key}");

        left + usize::from(!self.is_red(Some(node)))
    }
}

impl Engine for RbTree {
    type Meta = Color;

    const KIND: Kind = Kind::RedBlack;

    fn raw(&self) -> &RawTree<Color> {
        &self.raw
    }

    fn node_label(&self, node: NodeId) -> String {
        let suffix = match self.raw.meta(node) {
            Color::Red => "(R)",
            Color::Black => "(B)",
        };
        format!("{}{suffix}", self.raw.key(node))
    }

    /// Inserts `key` as a red leaf and repairs the coloring upwards.
    ///
    /// This operation completes in _O(log(n))_ time.
    fn insert(&mut self, key: Key, value: Value) -> bool {
        match self.raw.probe(key) {
            Probe::Occupied { node, .. } => {
                self.raw.set_value(node, value);
                false
            }
            Probe::Vacant(at) => {
                let node = self.raw.attach(at, key, value, Color::Red);
                self.insert_fixup(node);
                tracing::debug!(target: "reactive_trees::rb", key, "inserted");
                true
            }
        }
    }

    /// Removes `key`.
    ///
    /// The physically removed position is `key`'s node if it has fewer than two children, or else
    /// its in-order successor, which then takes over the removed node's color. If that position
    /// held a black node the fixup runs from the node that replaced it.
    ///
    /// This operation completes in _O(log(n))_ time.
    fn remove(&mut self, key: Key) -> bool {
        let Some((node, _)) = self.raw.find(key) else {
            return false;
        };

        let removed_color = match (self.raw.left(node), self.raw.right(node)) {
            (Some(_), Some(right)) => self.color(Some(self.raw.min_in_subtree(right))),
            _ => self.color(Some(node)),
        };

        let unlinked = self.raw.unlink(node);
        if let Some(successor) = unlinked.moved {
            self.set_color(successor, unlinked.meta);
        }

        if removed_color == Color::Black {
            self.remove_fixup(unlinked.replacement, unlinked.replacement_parent);
        }

        tracing::debug!(target: "reactive_trees::rb", key, "removed");
        true
    }

    fn clear(&mut self) {
        self.raw.clear();
    }

    /// Adopts a parsed shape and derives a canonical coloring for it.
    ///
    /// Colors are not persisted. Any shape produced by this tree admits a valid coloring; a shape
    /// that does not is rebuilt by re-inserting its keys in preorder.
    fn from_shape(shape: RawTree<Color>) -> Self {
        let mut tree = RbTree { raw: shape };
        if tree.recolor() {
            return tree;
        }

        tracing::warn!(
            target: "reactive_trees::rb",
            len = tree.len(),
            "loaded shape admits no red-black coloring; rebuilding"
        );

        let mut rebuilt = RbTree::new();
        for node in traverse::node_ids(&tree.raw, Order::Pre) {
            rebuilt.insert(tree.raw.key(node), tree.raw.value(node));
        }
        rebuilt
    }

    fn assert_invariants(&self) {
        self.raw.assert_links();
        assert!(!self.is_red(self.raw.root()), "root is red");
        self.assert_invariants_at(self.raw.root());
    }
}

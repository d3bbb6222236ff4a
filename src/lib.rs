//! Ordered integer key-value trees with three interchangeable balancing strategies.
//!
//! - [`BstTree`]: a plain binary search tree. No rebalancing; worst-case height is _O(n)_.
//! - [`AvlTree`]: height-balanced. Every node's subtrees differ in height by at most one.
//! - [`RbTree`]: red-black. Color rules bound the height to `2 * log2(n + 1)`.
//!
//! All three implement [`Engine`], which fixes the shared semantics of search, insertion, removal,
//! traversal and the preorder persistence format. [`Forest`] holds one independent instance of
//! each and routes calls to the selected variant.
//!
//! Nodes are stored in an arena ([`raw::RawTree`]) and addressed by stable ids, so rotations and
//! splices are plain id reassignments.
//!
//! # Keys
//!
//! Keys and values are `i32`. Inserting a key that is already present overwrites its value and
//! leaves the shape untouched, so an in-order traversal is always strictly increasing.

use core::{fmt, ops::Not};

use arbitrary::Arbitrary;

pub mod avl;
pub mod bst;
pub mod codec;
mod error;
pub mod forest;
pub mod raw;
pub mod rb;
pub mod render;
pub mod traverse;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use avl::AvlTree;
pub use bst::BstTree;
pub use error::{Error, LoadError};
pub use forest::{Forest, Kind, Tree};
pub use raw::{NodeId, RawTree};
pub use rb::RbTree;
pub use traverse::{Iter, Order};

/// Key type stored in every tree.
pub type Key = i32;

/// Value type stored alongside each key.
pub type Value = i32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Node color of a red-black tree. Absent children count as black.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Arbitrary)]
pub enum Color {
    Red,
    #[default]
    Black,
}

/// Result of [`Engine::search`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub found: bool,
    /// Depth of the matching node, 0 at the root; `-1` if the key is absent.
    pub depth: i32,
}

impl SearchResult {
    pub const NOT_FOUND: SearchResult = SearchResult {
        found: false,
        depth: -1,
    };

    fn at_depth(depth: usize) -> SearchResult {
        SearchResult {
            found: true,
            depth: i32::try_from(depth).unwrap_or(i32::MAX),
        }
    }
}

/// The operation set shared by every balancing strategy.
///
/// Mutating operations rebalance before returning; read-only operations are provided on top of the
/// underlying [`RawTree`].
pub trait Engine: Default + Sized {
    /// Per-node balance metadata.
    type Meta: Copy + Default + fmt::Debug;

    /// The variant tag of this engine.
    const KIND: Kind;

    #[doc(hidden)]
    fn raw(&self) -> &RawTree<Self::Meta>;

    /// Inserts `key` with `value`.
    ///
    /// Returns `true` if a new node was created, or `false` if `key` was already present, in which
    /// case only its value is replaced.
    fn insert(&mut self, key: Key, value: Value) -> bool;

    /// Removes `key` from the tree. Returns `false` if it was not present.
    fn remove(&mut self, key: Key) -> bool;

    /// Removes every node.
    fn clear(&mut self);

    /// Adopts a freshly parsed shape, restoring this engine's balance metadata.
    ///
    /// Shapes that cannot satisfy the engine's invariants are rebuilt by re-insertion.
    #[doc(hidden)]
    fn from_shape(shape: RawTree<Self::Meta>) -> Self;

    /// Panics if the search-tree order, the parent links, or the balance invariant is broken.
    #[doc(hidden)]
    fn assert_invariants(&self);

    /// Text label for a node when rendering.
    fn node_label(&self, node: NodeId) -> String {
        self.raw().key(node).to_string()
    }

    /// Returns the number of nodes.
    fn len(&self) -> usize {
        self.raw().len()
    }

    /// Returns `true` if the tree contains no nodes.
    fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    /// Looks up `key`, reporting whether it exists and at which depth.
    fn search(&self, key: Key) -> SearchResult {
        match self.raw().find(key) {
            Some((_, depth)) => SearchResult::at_depth(depth),
            None => SearchResult::NOT_FOUND,
        }
    }

    /// Returns the value stored under `key`.
    fn get(&self, key: Key) -> Option<Value> {
        let raw = self.raw();
        raw.find(key).map(|(node, _)| raw.value(node))
    }

    /// Returns `true` if `key` is present.
    fn contains_key(&self, key: Key) -> bool {
        self.raw().find(key).is_some()
    }

    /// Returns the entry with the minimum key.
    fn first(&self) -> Option<(Key, Value)> {
        let raw = self.raw();
        let node = raw.min_in_subtree(raw.root()?);
        Some((raw.key(node), raw.value(node)))
    }

    /// Returns the entry with the maximum key.
    fn last(&self) -> Option<(Key, Value)> {
        let raw = self.raw();
        let node = raw.max_in_subtree(raw.root()?);
        Some((raw.key(node), raw.value(node)))
    }

    /// Returns the keys in the given visit order.
    fn keys(&self, order: Order) -> Vec<Key> {
        let raw = self.raw();
        traverse::node_ids(raw, order)
            .into_iter()
            .map(|node| raw.key(node))
            .collect()
    }

    fn preorder(&self) -> Vec<Key> {
        self.keys(Order::Pre)
    }

    fn inorder(&self) -> Vec<Key> {
        self.keys(Order::In)
    }

    fn postorder(&self) -> Vec<Key> {
        self.keys(Order::Post)
    }

    /// Returns an iterator over the entries in ascending key order.
    fn iter(&self) -> Iter<'_, Self::Meta> {
        Iter::new(self.raw())
    }

    /// Returns the number of nodes on the longest root-to-leaf path; 0 for an empty tree.
    fn height(&self) -> usize {
        traverse::height(self.raw())
    }

    /// Encodes the tree as a preorder token stream. See [`codec`].
    fn serialize(&self) -> String {
        codec::serialize(self.raw())
    }

    /// Rebuilds a tree from a preorder token stream. See [`codec`].
    fn deserialize(input: &str) -> Result<Self, LoadError> {
        let shape = codec::parse(input, Self::Meta::default())?;
        Ok(Self::from_shape(shape))
    }
}

//! Arena storage shared by every engine.
//!
//! Nodes live in a slab addressed by [`NodeId`]. Each node owns its two child slots; the parent
//! slot is a back-reference used only for upward walks during rotation and fixup. Structural
//! edits never move or reallocate a node, they only reassign ids.

use core::{fmt, mem};

use crate::{
    traverse::{self, Order},
    Dir, Key, Value,
};

/// Stable handle to a node in a [`RawTree`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type Link = Option<NodeId>;

#[derive(Clone, Debug)]
struct Node<M> {
    key: Key,
    value: Value,
    parent: Link,
    children: [Link; 2],
    meta: M,
}

/// Where a new node is to be attached.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum InsertAs {
    Root,
    Child { parent: NodeId, dir: Dir },
}

/// Outcome of descending the tree towards a key.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Probe {
    Occupied { node: NodeId, depth: usize },
    Vacant(InsertAs),
}

/// Result of physically unlinking a node with the transplant/successor splice.
pub(crate) struct Unlinked<M> {
    /// The node that took the place of the spliced-out position (possibly absent).
    pub(crate) replacement: Link,
    /// The parent of `replacement` after the splice, even when `replacement` is absent.
    pub(crate) replacement_parent: Link,
    /// The successor that was moved into the removed node's position, if any.
    pub(crate) moved: Link,
    /// Metadata of the removed node.
    pub(crate) meta: M,
}

/// A binary search tree of integer keys stored in a node arena.
///
/// `M` is the per-node balance metadata: `()` for the unbalanced engine, a cached height for AVL,
/// a [`Color`](crate::Color) for red-black.
#[derive(Clone)]
pub struct RawTree<M> {
    nodes: Vec<Option<Node<M>>>,
    free: Vec<NodeId>,
    root: Link,
    len: usize,
}

impl<M> Default for RawTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> RawTree<M> {
    /// Returns a new empty tree.
    pub const fn new() -> RawTree<M> {
        RawTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns `true` if the tree contains no nodes.
    pub fn is_empty(&self) -> bool {
        let empty = self.len == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of nodes in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the root node, if any.
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of arena slots, live or free. Every live id indexes below this bound.
    pub(crate) fn slots(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<M> {
        self.nodes[id.index()]
            .as_ref()
            .expect("node id refers to a freed slot")
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<M> {
        self.nodes[id.index()]
            .as_mut()
            .expect("node id refers to a freed slot")
    }

    pub fn key(&self, id: NodeId) -> Key {
        self.node(id).key
    }

    pub fn value(&self, id: NodeId) -> Value {
        self.node(id).value
    }

    pub fn meta(&self, id: NodeId) -> &M {
        &self.node(id).meta
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, Dir::Left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, Dir::Right)
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, dir: Dir) -> Link {
        self.node(id).children[dir as usize]
    }

    #[inline]
    pub(crate) fn set_meta(&mut self, id: NodeId, meta: M) -> M {
        mem::replace(&mut self.node_mut(id).meta, meta)
    }

    #[inline]
    pub(crate) fn set_value(&mut self, id: NodeId, value: Value) -> Value {
        mem::replace(&mut self.node_mut(id).value, value)
    }

    /// Overwrites the key and value of `id` in place, leaving its links untouched.
    pub(crate) fn set_payload(&mut self, id: NodeId, key: Key, value: Value) {
        let node = self.node_mut(id);
        node.key = key;
        node.value = value;
    }

    #[inline]
    fn set_parent(&mut self, id: NodeId, parent: Link) -> Link {
        mem::replace(&mut self.node_mut(id).parent, parent)
    }

    #[inline]
    fn set_child(&mut self, id: NodeId, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.node_mut(id).children[dir as usize], child)
    }

    #[inline]
    fn maybe_set_parent(&mut self, opt_node: Link, parent: Link) {
        if let Some(node) = opt_node {
            self.set_parent(node, parent);
        }
    }

    fn alloc(&mut self, key: Key, value: Value, meta: M) -> NodeId {
        let node = Node {
            key,
            value,
            parent: None,
            children: [None, None],
            meta,
        };

        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.nodes[id.index()].is_none());
                self.nodes[id.index()] = Some(node);
                id
            }
            None => {
                let id = u32::try_from(self.nodes.len()).expect("node arena exhausted");
                self.nodes.push(Some(node));
                NodeId(id)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<M> {
        let node = self.nodes[id.index()]
            .take()
            .expect("node id refers to a freed slot");
        self.free.push(id);
        node
    }

    /// Returns the node holding `key` and its depth, counted from 0 at the root.
    pub(crate) fn find(&self, key: Key) -> Option<(NodeId, usize)> {
        match self.probe(key) {
            Probe::Occupied { node, depth } => Some((node, depth)),
            Probe::Vacant(_) => None,
        }
    }

    /// Descends from the root towards `key`, going left on smaller keys and right otherwise.
    pub(crate) fn probe(&self, key: Key) -> Probe {
        let Some(mut cur) = self.root else {
            return Probe::Vacant(InsertAs::Root);
        };
        let mut depth = 0;

        loop {
            let cur_key = self.key(cur);
            if key == cur_key {
                return Probe::Occupied { node: cur, depth };
            }

            let dir = if key < cur_key { Dir::Left } else { Dir::Right };
            match self.child(cur, dir) {
                Some(child) => {
                    cur = child;
                    depth += 1;
                }
                None => return Probe::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    /// Creates a new leaf at `at` and links it to its parent.
    pub(crate) fn attach(&mut self, at: InsertAs, key: Key, value: Value, meta: M) -> NodeId {
        let node = self.alloc(key, value, meta);

        match at {
            InsertAs::Root => {
                debug_assert!(self.root.is_none(), "root slot is occupied");
                self.root = Some(node);
            }
            InsertAs::Child { parent, dir } => {
                let prev = self.set_child(parent, dir, Some(node));
                debug_assert!(prev.is_none(), "child slot is occupied");
                self.set_parent(node, Some(parent));
            }
        }

        self.len += 1;
        node
    }

    pub(crate) fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.left(parent) == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.right(parent), Some(child), "not a child of `parent`");
            Dir::Right
        }
    }

    // Replaces the child link of `parent` pointing at `old_child` with `new_child`, or the root
    // link if `parent` is absent.
    //
    // `new_child`'s parent link is not updated.
    #[inline]
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeId, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);
                self.set_child(parent, dir, new_child);
            }
            None => self.root = new_child,
        }
    }

    /// Puts `new` in the position held by `old`, re-pointing `new`'s parent link.
    ///
    /// `old`'s own links are left as they were.
    fn transplant(&mut self, old: NodeId, new: Link) {
        let parent = self.parent(old);
        self.replace_child_or_set_root(parent, old, new);
        self.maybe_set_parent(new, parent);
    }

    /// Rotates `down` towards `dir`, promoting its `!dir` child into its position.
    ///
    /// `rotate(y, Dir::Right)` is a right rotation: `y`'s left child takes `y`'s place, `y`
    /// becomes its right child, and its former right subtree becomes `y`'s left subtree.
    /// Returns the promoted node. Balance metadata is not updated.
    pub(crate) fn rotate(&mut self, down: NodeId, dir: Dir) -> NodeId {
        let up = self
            .child(down, !dir)
            .expect("rotation requires a child on the promoted side");

        // `across` moves from the `dir` side of `up` to the `!dir` side of `down`.
        let across = self.child(up, dir);
        self.set_child(down, !dir, across);
        self.maybe_set_parent(across, Some(down));

        let parent = self.parent(down);
        self.replace_child_or_set_root(parent, down, Some(up));
        self.set_parent(up, parent);

        self.set_child(up, dir, Some(down));
        self.set_parent(down, Some(up));

        tracing::trace!(
            target: "reactive_trees::rotate",
            down = ?down,
            up = ?up,
            dir = ?dir,
            "rotated"
        );

        up
    }

    /// Returns the minimum node in the subtree rooted at `root`.
    pub(crate) fn min_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;
        while let Some(left) = self.left(cur) {
            cur = left;
        }
        cur
    }

    /// Returns the maximum node in the subtree rooted at `root`.
    pub(crate) fn max_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;
        while let Some(right) = self.right(cur) {
            cur = right;
        }
        cur
    }

    /// Removes `z` from the tree with the transplant/successor splice and frees it.
    ///
    /// - No left child: `z` is replaced by its right subtree.
    /// - No right child: `z` is replaced by its left subtree.
    /// - Two children: the minimum `y` of the right subtree is spliced out (its right subtree
    ///   takes its place, unless `y` is `z`'s direct right child), then `y` takes `z`'s position
    ///   and adopts both of `z`'s subtrees.
    pub(crate) fn unlink(&mut self, z: NodeId) -> Unlinked<M> {
        let parent = self.parent(z);
        let left = self.left(z);
        let right = self.right(z);

        let (replacement, replacement_parent, moved) = match (left, right) {
            (None, _) => {
                self.transplant(z, right);
                (right, parent, None)
            }

            (Some(left), None) => {
                self.transplant(z, Some(left));
                (Some(left), parent, None)
            }

            (Some(left), Some(right)) => {
                let y = self.min_in_subtree(right);
                let x = self.right(y);

                let x_parent = if y == right {
                    Some(y)
                } else {
                    let y_parent = self.parent(y);
                    self.transplant(y, x);
                    self.set_child(y, Dir::Right, Some(right));
                    self.set_parent(right, Some(y));
                    y_parent
                };

                self.transplant(z, Some(y));
                self.set_child(y, Dir::Left, Some(left));
                self.set_parent(left, Some(y));

                (x, x_parent, Some(y))
            }
        };

        let node = self.release(z);
        self.len -= 1;

        Unlinked {
            replacement,
            replacement_parent,
            moved,
            meta: node.meta,
        }
    }

    /// Removes a node with at most one child, lifting that child into its position.
    ///
    /// Returns the removed node's former parent.
    pub(crate) fn unlink_unary(&mut self, node: NodeId) -> Link {
        let child = match (self.left(node), self.right(node)) {
            (Some(_), Some(_)) => panic!("node {node:?} has two children"),
            (Some(child), None) | (None, Some(child)) => Some(child),
            (None, None) => None,
        };

        let parent = self.parent(node);
        self.transplant(node, child);
        self.release(node);
        self.len -= 1;
        parent
    }

    /// Clears the tree, removing all nodes.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Panics if any parent link disagrees with the owning child link, if the search-tree order
    /// is broken, or if the node count is wrong.
    pub(crate) fn assert_links(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree has nonzero length");
            return;
        };

        assert_eq!(self.parent(root), None, "root has a parent link");

        let mut count = 0;
        // (node, exclusive lower bound, exclusive upper bound)
        let mut stack = vec![(root, None::<Key>, None::<Key>)];

        while let Some((node, lo, hi)) = stack.pop() {
            count += 1;
            let key = self.key(node);

            if let Some(lo) = lo {
                assert!(key > lo, "key {key} is not greater than ancestor {lo}");
            }
            if let Some(hi) = hi {
                assert!(key < hi, "key {key} is not less than ancestor {hi}");
            }

            for (dir, lo, hi) in [(Dir::Left, lo, Some(key)), (Dir::Right, Some(key), hi)] {
                if let Some(child) = self.child(node, dir) {
                    assert_eq!(
                        self.parent(child),
                        Some(node),
                        "{dir:?} child of {key} has a stale parent link"
                    );
                    stack.push((child, lo, hi));
                }
            }
        }

        assert_eq!(count, self.len, "reachable node count differs from length");
    }
}

impl<M: fmt::Debug> fmt::Debug for RawTree<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTree")
            .field("len", &self.len)
            .field("root", &self.root)
            .field("nodes", &Preorder(self))
            .finish()
    }
}

// Flat preorder listing of every node with its parent.
struct Preorder<'a, M>(&'a RawTree<M>);

impl<M: fmt::Debug> fmt::Debug for Preorder<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.0;
        f.debug_list()
            .entries(
                traverse::node_ids(tree, Order::Pre)
                    .into_iter()
                    .map(|id| DebugNode(tree, id)),
            )
            .finish()
    }
}

struct DebugNode<'a, M>(&'a RawTree<M>, NodeId);

impl<M: fmt::Debug> fmt::Debug for DebugNode<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DebugNode(tree, id) = *self;
        f.debug_struct("Node")
            .field("id", &id)
            .field("key", &tree.key(id))
            .field("meta", tree.meta(id))
            .field("parent", &tree.parent(id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{BstTree, Engine};

    #[test]
    fn debug_lists_nodes_in_preorder() {
        let mut tree = BstTree::new();
        for key in [2, 1, 3] {
            tree.insert(key, key);
        }

        let out = format!("{tree:?}");
        let (two, one, three) = (
            out.find("key: 2").unwrap(),
            out.find("key: 1").unwrap(),
            out.find("key: 3").unwrap(),
        );
        assert!(two < one && one < three, "{out}");
        assert!(out.contains("parent: None"));
    }

    #[test]
    fn debug_formats_deep_chain() {
        let mut input = String::new();
        for key in 0..100_000 {
            input.push_str(&key.to_string());
            input.push_str(" # ");
        }
        input.push_str("# ");

        let tree = BstTree::deserialize(&input).unwrap();
        let out = format!("{tree:?}");

        assert_eq!(out.matches("Node {").count(), 100_000);
    }
}

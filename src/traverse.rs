//! Traversal orders and depth helpers.

use std::collections::VecDeque;

use arbitrary::Arbitrary;

use crate::{
    raw::{Link, RawTree},
    Dir, Key, NodeId, Value,
};

/// Visit order of a depth-first traversal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Arbitrary)]
pub enum Order {
    /// Root, left subtree, right subtree.
    Pre,
    /// Left subtree, root, right subtree.
    In,
    /// Left subtree, right subtree, root.
    Post,
}

impl Order {
    pub const ALL: [Order; 3] = [Order::Pre, Order::In, Order::Post];

    pub fn label(self) -> &'static str {
        match self {
            Order::Pre => "Preorder",
            Order::In => "Inorder",
            Order::Post => "Postorder",
        }
    }
}

/// Returns the nodes of `tree` in the given order.
///
/// Walks with an explicit stack, so degenerate (list-shaped) trees do not exhaust the call stack.
pub(crate) fn node_ids<M>(tree: &RawTree<M>, order: Order) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(tree.len());
    let Some(root) = tree.root() else {
        return out;
    };

    match order {
        Order::Pre => {
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                out.push(node);
                stack.extend(tree.right(node));
                stack.extend(tree.left(node));
            }
        }

        Order::In => {
            let mut stack = Vec::new();
            let mut cur = Some(root);
            loop {
                while let Some(node) = cur {
                    stack.push(node);
                    cur = tree.left(node);
                }
                let Some(node) = stack.pop() else { break };
                out.push(node);
                cur = tree.right(node);
            }
        }

        Order::Post => {
            // Root-right-left, reversed.
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                out.push(node);
                stack.extend(tree.left(node));
                stack.extend(tree.right(node));
            }
            out.reverse();
        }
    }

    out
}

/// Number of nodes on the longest root-to-leaf path; 0 for an empty tree.
pub(crate) fn height<M>(tree: &RawTree<M>) -> usize {
    let mut level: VecDeque<NodeId> = tree.root().into_iter().collect();
    let mut height = 0;

    while !level.is_empty() {
        height += 1;
        for _ in 0..level.len() {
            let Some(node) = level.pop_front() else { break };
            level.extend(tree.left(node));
            level.extend(tree.right(node));
        }
    }

    height
}

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// In-order iterator over the entries of a tree, following parent links.
pub struct Iter<'tree, M> {
    tree: &'tree RawTree<M>,

    cur: Link,
    from: CameFrom,

    len: usize,
}

impl<'tree, M> Iter<'tree, M> {
    pub(crate) fn new(tree: &'tree RawTree<M>) -> Self {
        Iter {
            tree,
            cur: tree.root(),
            from: CameFrom::Parent,
            len: tree.len(),
        }
    }
}

impl<M> Iterator for Iter<'_, M> {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let tree = self.tree;
        let mut cur = self.cur?;

        loop {
            match self.from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    cur = tree.min_in_subtree(cur);

                    // Its (empty) left subtree has been exhausted.
                    self.from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    self.cur = Some(cur);
                    self.from = CameFrom::Here;
                    self.len -= 1;

                    return Some((tree.key(cur), tree.value(cur)));
                }

                CameFrom::Here => match tree.right(cur) {
                    Some(right) => {
                        self.from = CameFrom::Parent;
                        cur = right;
                    }
                    None => self.from = CameFrom::RightChild,
                },

                CameFrom::RightChild => {
                    // This subtree is exhausted. Climb until arriving from a left child; that
                    // parent is the successor.
                    loop {
                        let parent = tree.parent(cur)?;
                        let dir = tree.which_child(parent, cur);
                        cur = parent;

                        if dir == Dir::Left {
                            break;
                        }
                    }

                    self.from = CameFrom::LeftChild;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<M> ExactSizeIterator for Iter<'_, M> {}

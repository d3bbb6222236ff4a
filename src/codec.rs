//! Preorder token codec.
//!
//! A tree is written as its preorder traversal: a present node is its decimal key, an absent child
//! is the sentinel `#`, and every token is followed by a single space. The empty tree is `"# "`.
//!
//! ```text
//!       20
//!      /  \          20 10 # # 30 # #
//!    10    30
//! ```
//!
//! Only the shape and keys are stored. Values are restored equal to their keys and balance
//! metadata is recomputed by the loading engine.

use crate::{
    raw::{InsertAs, RawTree},
    traverse::{self, Order},
    Dir, LoadError,
};

/// Token encoding an absent child.
pub const ABSENT: &str = "#";

/// Encodes `tree` as a preorder token stream.
pub fn serialize<M>(tree: &RawTree<M>) -> String {
    let mut out = String::new();
    let mut stack = vec![tree.root()];

    while let Some(slot) = stack.pop() {
        match slot {
            None => out.push_str("# "),
            Some(node) => {
                out.push_str(&tree.key(node).to_string());
                out.push(' ');
                stack.push(tree.right(node));
                stack.push(tree.left(node));
            }
        }
    }

    out
}

/// Parses a preorder token stream into a bare shape, giving every node `meta`.
///
/// Tokens may be separated by any whitespace. A stream with no tokens at all is the empty tree.
pub fn parse<M: Copy>(input: &str, meta: M) -> Result<RawTree<M>, LoadError> {
    let mut tree = RawTree::new();
    let mut tokens = input.split_whitespace().enumerate().peekable();

    if tokens.peek().is_none() {
        return Ok(tree);
    }

    // Slots still to be filled, innermost last.
    let mut pending = vec![InsertAs::Root];
    let mut consumed = 0;

    while let Some(at) = pending.pop() {
        let Some((position, token)) = tokens.next() else {
            return Err(LoadError::UnexpectedEnd { position: consumed });
        };
        consumed = position + 1;

        if token == ABSENT {
            continue;
        }

        let key = token.parse().map_err(|_| LoadError::InvalidToken {
            position,
            token: token.to_owned(),
        })?;

        let node = tree.attach(at, key, key, meta);
        pending.push(InsertAs::Child {
            parent: node,
            dir: Dir::Right,
        });
        pending.push(InsertAs::Child {
            parent: node,
            dir: Dir::Left,
        });
    }

    if let Some((position, _)) = tokens.next() {
        return Err(LoadError::TrailingTokens { position });
    }

    check_order(&tree)?;

    tracing::debug!(target: "reactive_trees::codec", len = tree.len(), "parsed tree");
    Ok(tree)
}

fn check_order<M>(tree: &RawTree<M>) -> Result<(), LoadError> {
    let keys = traverse::node_ids(tree, Order::In)
        .into_iter()
        .map(|node| tree.key(node));

    let mut prev = None;
    for key in keys {
        if prev.is_some_and(|prev| prev >= key) {
            return Err(LoadError::OutOfOrder { key });
        }
        prev = Some(key);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use super::*;
    use crate::{AvlTree, BstTree, Engine, RbTree};

    #[test]
    fn empty_tree() {
        assert_eq!(BstTree::new().serialize(), "# ");
        assert!(BstTree::deserialize("# ").unwrap().is_empty());
        assert!(BstTree::deserialize("").unwrap().is_empty());
        assert!(BstTree::deserialize(" \n\t").unwrap().is_empty());
    }

    #[test]
    fn encodes_preorder_with_sentinels() {
        let mut tree = BstTree::new();
        for key in [20, 10, 30, -5] {
            tree.insert(key, 0);
        }

        assert_eq!(tree.serialize(), "20 10 -5 # # # 30 # # ");
    }

    #[test]
    fn loaded_values_equal_keys() {
        let tree = BstTree::deserialize("20 10 # # 30 # #").unwrap();

        assert_eq!(tree.get(10), Some(10));
        assert_eq!(tree.get(30), Some(30));
        tree.assert_invariants();
    }

    #[test]
    fn accepts_any_whitespace() {
        let tree = BstTree::deserialize("2\n1 #\t#\n\n3 # #\n").unwrap();
        assert_eq!(tree.preorder(), [2, 1, 3]);
    }

    #[test]
    fn unexpected_end() {
        assert_eq!(
            BstTree::deserialize("5 #").unwrap_err(),
            LoadError::UnexpectedEnd { position: 2 }
        );
        assert_eq!(
            BstTree::deserialize("5").unwrap_err(),
            LoadError::UnexpectedEnd { position: 1 }
        );
    }

    #[test]
    fn invalid_token() {
        assert_eq!(
            BstTree::deserialize("x # #").unwrap_err(),
            LoadError::InvalidToken {
                position: 0,
                token: "x".into()
            }
        );
        assert!(matches!(
            BstTree::deserialize("1 99999999999 # # #"),
            Err(LoadError::InvalidToken { position: 1, .. })
        ));
    }

    #[test]
    fn trailing_tokens() {
        assert_eq!(
            BstTree::deserialize("5 # # 6").unwrap_err(),
            LoadError::TrailingTokens { position: 3 }
        );
    }

    #[test]
    fn out_of_order() {
        assert_eq!(
            BstTree::deserialize("5 6 # # #").unwrap_err(),
            LoadError::OutOfOrder { key: 5 }
        );
        assert_eq!(
            BstTree::deserialize("5 # 5 # #").unwrap_err(),
            LoadError::OutOfOrder { key: 5 }
        );
    }

    #[test]
    fn shapes_survive_round_trip() {
        let keys = [41, 7, 93, 15, 62, 3, 88, 29, 50, 71, 11, 99, 36];

        let mut bst = BstTree::new();
        let mut avl = AvlTree::new();
        let mut rb = RbTree::new();
        for key in keys {
            bst.insert(key, key);
            avl.insert(key, key);
            rb.insert(key, key);
        }

        let bst2 = BstTree::deserialize(&bst.serialize()).unwrap();
        let avl2 = AvlTree::deserialize(&avl.serialize()).unwrap();
        let rb2 = RbTree::deserialize(&rb.serialize()).unwrap();

        assert_eq!(bst2.preorder(), bst.preorder());
        assert_eq!(avl2.preorder(), avl.preorder());
        assert_eq!(rb2.preorder(), rb.preorder());

        avl2.assert_invariants();
        rb2.assert_invariants();
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let mut input = String::new();
        for key in 0..100_000 {
            write!(input, "{key} # ").unwrap();
        }
        input.push_str("# ");

        let tree = BstTree::deserialize(&input).unwrap();
        assert_eq!(tree.len(), 100_000);
        assert_eq!(tree.serialize(), input);
    }
}

//! Text renderings of a tree.
//!
//! These functions only build strings; printing them is up to the caller.

use std::{
    collections::VecDeque,
    fmt::{self, Write},
};

use crate::{traverse, Engine, NodeId};

/// Trees taller than this are rendered as an outline instead of a grid. The grid width doubles
/// with every level, and at this height it still fits a terminal.
pub const MAX_GRID_HEIGHT: usize = 6;

/// Renders `tree` as a two-dimensional grid.
///
/// A tree of height `h` occupies `2h - 1` rows and `2^h - 1` columns. Each key sits at the middle
/// column of the span allotted to its subtree; its children split the span's halves, and `/` or
/// `\` markers on the row below point at them.
///
/// ```text
///  20
///  / \
/// 10 30
/// ```
pub fn layout<E: Engine>(tree: &E) -> String {
    let raw = tree.raw();
    let Some(root) = raw.root() else {
        return String::from("Tree is empty.\n");
    };

    let height = traverse::height(raw);
    if height > MAX_GRID_HEIGHT {
        return outline(tree);
    }

    let width = (1usize << height) - 1;
    let rows = height * 2 - 1;
    let mut grid = vec![vec![String::from(" "); width]; rows];

    // (node, row, first column, last column)
    let mut stack = vec![(root, 0, 0, width - 1)];
    while let Some((node, row, left, right)) = stack.pop() {
        let mid = (left + right) / 2;
        grid[row][mid] = tree.node_label(node);

        if let Some(child) = raw.left(node) {
            grid[row + 1][(left + mid - 1) / 2] = String::from("/");
            stack.push((child, row + 2, left, mid - 1));
        }
        if let Some(child) = raw.right(node) {
            grid[row + 1][(mid + 1 + right) / 2] = String::from("\\");
            stack.push((child, row + 2, mid + 1, right));
        }
    }

    let mut out = String::new();
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    out
}

/// Renders `tree` as an indented outline, one node per line in preorder.
///
/// ```text
/// 20
/// ├─ L 10
/// └─ R 30
/// ```
pub fn outline<E: Engine>(tree: &E) -> String {
    let raw = tree.raw();
    let Some(root) = raw.root() else {
        return String::from("Tree is empty.\n");
    };

    let mut out = String::new();
    // (node, indent, branch)
    let mut stack: Vec<(NodeId, String, &str)> = vec![(root, String::new(), "")];

    while let Some((node, indent, branch)) = stack.pop() {
        out.push_str(&indent);
        out.push_str(branch);
        out.push_str(&tree.node_label(node));
        out.push('\n');

        let child_indent = match branch {
            "" => indent,
            b if b.starts_with('├') => format!("{indent}│  "),
            _ => format!("{indent}   "),
        };

        let left = raw.left(node);
        let right = raw.right(node);
        match (left, right) {
            (Some(l), Some(r)) => {
                stack.push((r, child_indent.clone(), "└─ R "));
                stack.push((l, child_indent, "├─ L "));
            }
            (Some(l), None) => stack.push((l, child_indent, "└─ L ")),
            (None, Some(r)) => stack.push((r, child_indent, "└─ R ")),
            (None, None) => {}
        }
    }

    out
}

/// Writes `tree` as a Graphviz digraph, one rank per level, with point-shaped placeholders for
/// absent children.
pub fn dotgraph<E, W>(tree: &E, name: &str, mut w: W) -> fmt::Result
where
    E: Engine,
    W: fmt::Write,
{
    let raw = tree.raw();
    let Some(root) = raw.root() else {
        return write!(w, "digraph \"graph-{name}\" {{}}");
    };

    enum Item {
        Node(NodeId),
        Missing(u32),
    }

    let mut queue = VecDeque::new();
    queue.push_back(Item::Node(root));

    write!(
        w,
        "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
    )?;

    let mut missing = 0;
    let mut links = String::new();

    while !queue.is_empty() {
        write!(w, "{{rank=same; ")?;

        for _ in 0..queue.len() {
            let Some(item) = queue.pop_front() else { break };

            let node = match item {
                Item::Node(node) => node,
                Item::Missing(id) => {
                    write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                    continue;
                }
            };

            let key = raw.key(node);
            let label = tree.node_label(node);
            write!(w, "\"graph{name}-{key}\" [label=\"{label}\"]; ")?;

            for child in [raw.left(node), raw.right(node)] {
                match child {
                    Some(child) => {
                        let child_key = raw.key(child);
                        queue.push_back(Item::Node(child));
                        writeln!(links, "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";")?;
                    }
                    None => {
                        queue.push_back(Item::Missing(missing));
                        writeln!(links, "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";")?;
                        missing += 1;
                    }
                }
            }
        }

        writeln!(w, "}}")?;
    }

    w.write_str(&links)?;

    w.write_str(" }\n}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BstTree, Key, RbTree};

    fn bst(keys: &[Key]) -> BstTree {
        let mut tree = BstTree::new();
        for &key in keys {
            tree.insert(key, key);
        }
        tree
    }

    #[test]
    fn empty() {
        assert_eq!(layout(&BstTree::new()), "Tree is empty.\n");
    }

    #[test]
    fn single_node() {
        assert_eq!(layout(&bst(&[7])), "7\n");
    }

    #[test]
    fn three_nodes() {
        assert_eq!(layout(&bst(&[20, 10, 30])), " 20 \n/ \\\n10 30\n");
    }

    #[test]
    fn red_black_labels() {
        let mut tree = RbTree::new();
        for key in [10, 20, 30] {
            tree.insert(key, key);
        }

        assert_eq!(layout(&tree), " 20(B) \n/ \\\n10(R) 30(R)\n");
    }

    #[test]
    fn tall_tree_falls_back_to_outline() {
        let keys: Vec<Key> = (0..(MAX_GRID_HEIGHT as Key + 1)).collect();
        let out = layout(&bst(&keys));

        assert_eq!(out.lines().count(), keys.len());
        assert!(out.starts_with("0\n└─ R 1\n   └─ R 2\n"));
    }

    #[test]
    fn grid_up_to_cutoff() {
        let keys: Vec<Key> = (0..MAX_GRID_HEIGHT as Key).collect();
        let out = layout(&bst(&keys));

        assert_eq!(out.lines().count(), 2 * MAX_GRID_HEIGHT - 1);
        assert!(out.lines().all(|line| line.len() < 100));
    }

    #[test]
    fn ascending_console_run_stays_small() {
        let keys: Vec<Key> = (0..16).collect();
        let out = layout(&bst(&keys));

        assert_eq!(out.lines().count(), 16);
        assert!(out.len() < 1024, "{} bytes", out.len());
    }

    #[test]
    fn outline_branches() {
        let out = outline(&bst(&[20, 10, 30, 5]));
        assert_eq!(out, "20\n├─ L 10\n│  └─ L 5\n└─ R 30\n");
    }

    #[test]
    fn dotgraph_lists_every_node() {
        let mut out = String::new();
        dotgraph(&bst(&[2, 1, 3]), "t", &mut out).unwrap();

        assert!(out.starts_with("digraph \"graph-t\""));
        for key in 1..=3 {
            assert!(out.contains(&format!("\"grapht-{key}\" [label=\"{key}\"]")));
        }
        assert_eq!(out.matches("[shape=point]").count(), 4);
    }
}

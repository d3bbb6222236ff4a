//! The closed set of engines and a holder for one independent tree of each kind.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use arbitrary::Arbitrary;

use crate::{
    render, AvlTree, BstTree, Engine, Error, Key, LoadError, Order, RbTree, SearchResult, Value,
};

/// Balancing strategy of a tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Arbitrary)]
pub enum Kind {
    Unbalanced,
    Avl,
    RedBlack,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Unbalanced, Kind::Avl, Kind::RedBlack];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Unbalanced => "Binary Search Tree",
            Kind::Avl => "AVL Tree",
            Kind::RedBlack => "Red-Black Tree",
        }
    }

    /// File holding the persisted tree of this kind inside a data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Kind::Unbalanced => "bst.txt",
            Kind::Avl => "avl.txt",
            Kind::RedBlack => "rb.txt",
        }
    }
}

/// A tree of any kind.
#[derive(Clone, Debug)]
pub enum Tree {
    Unbalanced(BstTree),
    Avl(AvlTree),
    RedBlack(RbTree),
}

macro_rules! dispatch {
    ($tree:expr, $t:ident => $body:expr) => {
        match $tree {
            Tree::Unbalanced($t) => $body,
            Tree::Avl($t) => $body,
            Tree::RedBlack($t) => $body,
        }
    };
}

impl Tree {
    /// Returns a new empty tree of the given kind.
    pub fn new(kind: Kind) -> Tree {
        match kind {
            Kind::Unbalanced => Tree::Unbalanced(BstTree::new()),
            Kind::Avl => Tree::Avl(AvlTree::new()),
            Kind::RedBlack => Tree::RedBlack(RbTree::new()),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Tree::Unbalanced(_) => BstTree::KIND,
            Tree::Avl(_) => AvlTree::KIND,
            Tree::RedBlack(_) => RbTree::KIND,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, t => t.len())
    }

    pub fn is_empty(&self) -> bool {
        dispatch!(self, t => t.is_empty())
    }

    /// See [`Engine::insert`].
    pub fn insert(&mut self, key: Key, value: Value) -> bool {
        dispatch!(self, t => t.insert(key, value))
    }

    /// See [`Engine::remove`].
    pub fn remove(&mut self, key: Key) -> bool {
        dispatch!(self, t => t.remove(key))
    }

    pub fn search(&self, key: Key) -> SearchResult {
        dispatch!(self, t => t.search(key))
    }

    pub fn get(&self, key: Key) -> Option<Value> {
        dispatch!(self, t => t.get(key))
    }

    pub fn first(&self) -> Option<(Key, Value)> {
        dispatch!(self, t => t.first())
    }

    pub fn last(&self) -> Option<(Key, Value)> {
        dispatch!(self, t => t.last())
    }

    pub fn keys(&self, order: Order) -> Vec<Key> {
        dispatch!(self, t => t.keys(order))
    }

    /// Entries in ascending key order.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        dispatch!(self, t => t.iter().collect())
    }

    pub fn height(&self) -> usize {
        dispatch!(self, t => t.height())
    }

    pub fn clear(&mut self) {
        dispatch!(self, t => t.clear())
    }

    pub fn serialize(&self) -> String {
        dispatch!(self, t => t.serialize())
    }

    /// Parses a tree of the given kind. See [`codec`](crate::codec).
    pub fn deserialize(kind: Kind, input: &str) -> Result<Tree, LoadError> {
        Ok(match kind {
            Kind::Unbalanced => Tree::Unbalanced(BstTree::deserialize(input)?),
            Kind::Avl => Tree::Avl(AvlTree::deserialize(input)?),
            Kind::RedBlack => Tree::RedBlack(RbTree::deserialize(input)?),
        })
    }

    /// See [`render::layout`].
    pub fn layout(&self) -> String {
        dispatch!(self, t => render::layout(t))
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        dispatch!(self, t => t.assert_invariants())
    }
}

/// One independent tree of every [`Kind`], plus a current selection.
///
/// Operations without an explicit kind apply to the selected tree. Keys are inserted with a value
/// equal to the key.
#[derive(Clone, Debug)]
pub struct Forest {
    trees: [Tree; 3],
    current: Kind,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    /// Returns a forest of empty trees with the unbalanced tree selected.
    pub fn new() -> Forest {
        Forest {
            trees: Kind::ALL.map(Tree::new),
            current: Kind::Unbalanced,
        }
    }

    pub fn select(&mut self, kind: Kind) {
        self.current = kind;
    }

    pub fn current_kind(&self) -> Kind {
        self.current
    }

    pub fn tree(&self, kind: Kind) -> &Tree {
        &self.trees[kind as usize]
    }

    pub fn tree_mut(&mut self, kind: Kind) -> &mut Tree {
        &mut self.trees[kind as usize]
    }

    pub fn current(&self) -> &Tree {
        self.tree(self.current)
    }

    pub fn current_mut(&mut self) -> &mut Tree {
        self.tree_mut(self.current)
    }

    pub fn insert(&mut self, key: Key) -> bool {
        self.current_mut().insert(key, key)
    }

    pub fn remove(&mut self, key: Key) -> bool {
        self.current_mut().remove(key)
    }

    pub fn search(&self, key: Key) -> SearchResult {
        self.current().search(key)
    }

    pub fn keys(&self, order: Order) -> Vec<Key> {
        self.current().keys(order)
    }

    pub fn clear(&mut self) {
        self.current_mut().clear();
    }

    pub fn layout(&self) -> String {
        self.current().layout()
    }

    /// Path of the file holding the tree of `kind` under `dir`.
    pub fn path(dir: &Path, kind: Kind) -> PathBuf {
        dir.join(kind.file_name())
    }

    /// Writes the tree of `kind` to its file under `dir`.
    pub fn save(&self, dir: &Path, kind: Kind) -> Result<(), Error> {
        let path = Self::path(dir, kind);
        fs::write(&path, self.tree(kind).serialize())
            .map_err(|source| Error::Write { path: path.clone(), source })?;

        tracing::debug!(target: "reactive_trees::forest", path = %path.display(), ?kind, "saved");
        Ok(())
    }

    /// Writes every tree to its file under `dir`.
    pub fn save_all(&self, dir: &Path) -> Result<(), Error> {
        Kind::ALL.into_iter().try_for_each(|kind| self.save(dir, kind))
    }

    /// Replaces the tree of `kind` with the contents of its file under `dir`.
    ///
    /// A missing file loads as an empty tree. On error the tree is left empty.
    pub fn load(&mut self, dir: &Path, kind: Kind) -> Result<(), Error> {
        let path = Self::path(dir, kind);
        let tree = self.tree_mut(kind);
        tree.clear();

        let input = match fs::read_to_string(&path) {
            Ok(input) => input,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(target: "reactive_trees::forest", path = %path.display(), "no saved tree");
                return Ok(());
            }
            Err(source) => return Err(Error::Read { path, source }),
        };

        *tree = Tree::deserialize(kind, &input).map_err(|source| Error::Load {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(
            target: "reactive_trees::forest",
            path = %path.display(),
            len = tree.len(),
            "loaded"
        );
        Ok(())
    }

    /// Loads every tree from `dir`, returning the errors of the ones that failed.
    ///
    /// Trees that fail to load are left empty.
    pub fn load_all(&mut self, dir: &Path) -> Vec<Error> {
        Kind::ALL
            .into_iter()
            .filter_map(|kind| self.load(dir, kind).err())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trees_are_independent() {
        let mut forest = Forest::new();

        forest.select(Kind::Avl);
        for key in [10, 20, 30] {
            forest.insert(key);
        }

        forest.select(Kind::RedBlack);
        forest.insert(5);

        assert!(forest.tree(Kind::Unbalanced).is_empty());
        assert_eq!(forest.tree(Kind::Avl).keys(Order::Pre), [20, 10, 30]);
        assert_eq!(forest.tree(Kind::RedBlack).keys(Order::In), [5]);
        assert_eq!(forest.current().kind(), Kind::RedBlack);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut forest = Forest::new();

        for kind in Kind::ALL {
            forest.select(kind);
            for key in [41, 7, 93, 15, 62, 3, 88] {
                forest.insert(key);
            }
        }
        forest.save_all(dir.path()).unwrap();

        let mut loaded = Forest::new();
        assert!(loaded.load_all(dir.path()).is_empty());

        for kind in Kind::ALL {
            assert_eq!(
                loaded.tree(kind).keys(Order::Pre),
                forest.tree(kind).keys(Order::Pre)
            );
            loaded.tree(kind).assert_invariants();
        }
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut forest = Forest::new();
        forest.insert(1);

        assert!(forest.load_all(dir.path()).is_empty());
        assert!(forest.current().is_empty());
    }

    #[test]
    fn malformed_file_leaves_tree_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("avl.txt"), "5 #").unwrap();

        let mut forest = Forest::new();
        forest.select(Kind::Avl);
        forest.insert(1);

        let err = forest.load(dir.path(), Kind::Avl).unwrap_err();
        assert!(matches!(
            err,
            Error::Load {
                source: LoadError::UnexpectedEnd { .. },
                ..
            }
        ));
        assert!(forest.current().is_empty());
    }
}

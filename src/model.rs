//! Model-based equivalence testing against [`BTreeMap`].
//!
//! Used by the property tests and by the fuzz targets under `fuzz/`.

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{Key, Kind, Order, Tree, Value};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    /// Picks a key currently in the tree, so removals and lookups hit.
    Index(usize),
    Random(Key),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in -500i32..500,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Search(ItemValue),
    Remove(ItemValue),
    First,
    Last,
    Reload,
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[Key]) -> FinalOp {
        fn get_value(v: &[Key], i: ItemValue) -> Key {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as Key
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Search(item) => FinalOp::Search(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
            Op::Reload => FinalOp::Reload,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(Key),
    Get(Key),
    Search(Key),
    Remove(Key),
    First,
    Last,
    Reload,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        8 => value_strategy().prop_map(Op::Insert),
        2 => value_strategy().prop_map(Op::Get),
        2 => value_strategy().prop_map(Op::Search),
        4 => value_strategy().prop_map(Op::Remove),
        1 => Just(Op::First),
        1 => Just(Op::Last),
        1 => Just(Op::Reload),
        1 => Just(Op::Clear),
    ]
}

/// Input for the fuzz targets: an engine and a sequence of operations to run against it.
#[derive(Clone, Debug, Arbitrary)]
pub struct EquivalenceInput {
    pub kind: Kind,
    pub ops: Vec<Op>,
}

/// Applies `ops` to a tree of `kind` and to a [`BTreeMap`], asserting after every step that both
/// agree and that the tree's invariants hold.
pub fn run_btree_equivalence(kind: Kind, ops: Vec<Op>) {
    let mut sorted_keys: Vec<Key> = Vec::with_capacity(ops.len());
    let mut btree: BTreeMap<Key, Value> = BTreeMap::new();
    let mut tree = Tree::new(kind);

    fn insert_sorted(v: &mut Vec<Key>, key: Key) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<Key>, key: Key) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);
        // Distinct per step, so overwrites are observable.
        let value = op_id as Value;

        match final_op {
            FinalOp::Insert(key) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = btree.insert(key, value).is_none();
                let from_tree = tree.insert(key, value);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key).copied();
                let from_tree = tree.get(key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Search(key) => {
                let result = tree.search(key);

                assert_eq!(
                    btree.contains_key(&key),
                    result.found,
                    "FinalOp #{op_id}: {final_op:?}"
                );
                if result.found {
                    assert!(
                        (result.depth as usize) < tree.height(),
                        "FinalOp #{op_id}: depth {} exceeds height",
                        result.depth
                    );
                } else {
                    assert_eq!(result.depth, -1, "FinalOp #{op_id}: {final_op:?}");
                }
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove(&key).is_some();
                let from_tree = tree.remove(key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value().map(|(&k, &v)| (k, v));
                assert_eq!(from_btree, tree.first(), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value().map(|(&k, &v)| (k, v));
                assert_eq!(from_btree, tree.last(), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Reload => {
                let encoded = tree.serialize();
                let preorder = tree.keys(Order::Pre);

                tree = Tree::deserialize(kind, &encoded)
                    .unwrap_or_else(|err| panic!("FinalOp #{op_id}: reload failed: {err}"));

                // Shapes written by an engine load back unchanged.
                assert_eq!(preorder, tree.keys(Order::Pre), "FinalOp #{op_id}: {final_op:?}");

                // Values are not persisted.
                for (key, value) in btree.iter_mut() {
                    *value = *key;
                }
            }

            FinalOp::Clear => {
                sorted_keys.clear();
                btree.clear();
                tree.clear();
            }
        }

        tree.assert_invariants();
        assert_eq!(btree.len(), tree.len());
        assert!(btree
            .iter()
            .map(|(&k, &v)| (k, v))
            .eq(tree.entries().into_iter()));
    }
}

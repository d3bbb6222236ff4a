use std::ops::Range;

use proptest::prelude::*;

use crate::model;

use super::*;

fn insert_find_all(kind: Kind, keys: &[Key]) {
    let mut tree = Tree::new(kind);

    for &key in keys {
        assert!(tree.insert(key, key));
        tree.assert_invariants();
    }

    for &key in keys {
        let result = tree.search(key);
        assert!(result.found, "{kind:?}: {key} not found after inserting {keys:?}");
        assert_eq!(tree.get(key), Some(key));
    }

    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(tree.keys(Order::In), sorted);
}

fn insert_remove_all(kind: Kind, keys: &[Key]) {
    let mut tree = Tree::new(kind);

    for &key in keys {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    for &key in keys {
        assert!(tree.remove(key), "{kind:?}: failed to remove {key} from {keys:?}");
        tree.assert_invariants();
        assert!(!tree.search(key).found);
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    for &key in keys.iter().rev() {
        assert!(tree.remove(key), "{kind:?}: failed to remove {key} from {keys:?}");
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

// Every ordering of `0..n`.
fn permutations(n: Key) -> Vec<Vec<Key>> {
    fn go(prefix: &mut Vec<Key>, rest: &mut Vec<Key>, out: &mut Vec<Vec<Key>>) {
        if rest.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            go(prefix, rest, out);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    let mut out = Vec::new();
    go(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

#[test]
fn zero_elems_find() {
    for kind in Kind::ALL {
        insert_find_all(kind, &[]);
    }
}

#[test]
fn single_elem_find() {
    for kind in Kind::ALL {
        insert_find_all(kind, &[0]);
    }
}

#[test]
fn three_elems_find() {
    for kind in Kind::ALL {
        insert_find_all(kind, &[0, 1, 2]);
        insert_find_all(kind, &[0, 2, 1]);
        insert_find_all(kind, &[1, 0, 2]);
        insert_find_all(kind, &[1, 2, 0]);
        insert_find_all(kind, &[2, 0, 1]);
        insert_find_all(kind, &[2, 1, 0]);
    }
}

#[test]
fn up_to_six_elems_find() {
    for kind in Kind::ALL {
        for n in 4..=6 {
            for keys in permutations(n) {
                insert_find_all(kind, &keys);
            }
        }
    }
}

#[test]
fn remove_one() {
    for kind in Kind::ALL {
        insert_remove_all(kind, &[0]);
    }
}

#[test]
fn remove_three() {
    for kind in Kind::ALL {
        insert_remove_all(kind, &[0, 1, 2]);
        insert_remove_all(kind, &[0, 2, 1]);
        insert_remove_all(kind, &[1, 0, 2]);
        insert_remove_all(kind, &[1, 2, 0]);
        insert_remove_all(kind, &[2, 0, 1]);
        insert_remove_all(kind, &[2, 1, 0]);
    }
}

#[test]
fn remove_up_to_six() {
    for kind in Kind::ALL {
        for n in 4..=6 {
            for keys in permutations(n) {
                insert_remove_all(kind, &keys);
            }
        }
    }
}

#[test]
fn avl_balanced_input() {
    let mut tree = Tree::new(Kind::Avl);
    for key in [50, 30, 70, 20, 40, 60, 80] {
        tree.insert(key, key);
    }

    assert_eq!(tree.keys(Order::In), [20, 30, 40, 50, 60, 70, 80]);
    assert_eq!(tree.keys(Order::Pre)[0], 50);
    assert_eq!(tree.search(50), SearchResult { found: true, depth: 0 });
}

#[test]
fn avl_single_left_rotation() {
    let mut tree = Tree::new(Kind::Avl);
    for key in [10, 20, 30] {
        tree.insert(key, key);
    }

    assert_eq!(tree.keys(Order::Pre), [20, 10, 30]);
    assert_eq!(tree.search(10).depth, 1);
    assert_eq!(tree.search(30).depth, 1);
}

#[test]
fn red_black_three_ascending() {
    let mut tree = RbTree::new();
    for key in [10, 20, 30] {
        tree.insert(key, key);
    }

    assert_eq!(tree.preorder(), [20, 10, 30]);
    assert_eq!(tree.color_of(20), Some(Color::Black));
    assert_eq!(tree.color_of(10), Some(Color::Red));
    assert_eq!(tree.color_of(30), Some(Color::Red));
}

#[test]
fn remove_only_node() {
    for kind in Kind::ALL {
        let mut tree = Tree::new(kind);
        tree.insert(42, 42);

        assert!(tree.remove(42));
        assert!(tree.is_empty());
        assert_eq!(tree.search(42), SearchResult::NOT_FOUND);
        assert_eq!(tree.search(0), SearchResult::NOT_FOUND);
        assert_eq!(tree.serialize(), "# ");
    }
}

#[test]
fn remove_missing_key() {
    for kind in Kind::ALL {
        let mut tree = Tree::new(kind);
        assert!(!tree.remove(1));

        tree.insert(2, 2);
        assert!(!tree.remove(1));
        assert_eq!(tree.len(), 1);
    }
}

#[test]
fn duplicates_overwrite() {
    for kind in Kind::ALL {
        let mut tree = Tree::new(kind);
        for key in [5, 3, 8] {
            tree.insert(key, key);
        }
        let shape = tree.keys(Order::Pre);

        assert!(!tree.insert(3, 33));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(3), Some(33));
        assert_eq!(tree.keys(Order::Pre), shape);
    }
}

#[test]
fn clear_then_reuse() {
    for kind in Kind::ALL {
        let mut tree = Tree::new(kind);
        for key in 0..20 {
            tree.insert(key, key);
        }

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.first(), None);

        tree.insert(1, 1);
        tree.assert_invariants();
        assert_eq!(tree.keys(Order::In), [1]);
    }
}

#[test]
fn balanced_heights_are_logarithmic() {
    let keys: Vec<Key> = (0..4095).collect();

    for kind in [Kind::Avl, Kind::RedBlack] {
        let mut tree = Tree::new(kind);
        for &key in &keys {
            tree.insert(key, key);
        }
        // 2 * log2(n + 1) bounds both.
        assert!(tree.height() <= 24, "{kind:?}: height {}", tree.height());
    }

    let mut tree = Tree::new(Kind::Unbalanced);
    for &key in &keys {
        tree.insert(key, key);
    }
    assert_eq!(tree.height(), keys.len());
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn bst_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Kind::Unbalanced, ops);
    }

    #[test]
    fn avl_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Kind::Avl, ops);
    }

    #[test]
    fn rb_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Kind::RedBlack, ops);
    }

    #[test]
    fn round_trip_preserves_inorder(
        kind in proptest::sample::select(Kind::ALL.to_vec()),
        keys in proptest::collection::vec(-1000i32..1000, 0..200),
    ) {
        let mut tree = Tree::new(kind);
        for key in keys {
            tree.insert(key, key);
        }

        let loaded = Tree::deserialize(kind, &tree.serialize()).unwrap();
        loaded.assert_invariants();
        prop_assert_eq!(loaded.keys(Order::In), tree.keys(Order::In));
        prop_assert_eq!(loaded.keys(Order::Pre), tree.keys(Order::Pre));
    }
}

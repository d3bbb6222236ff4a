#![no_main]
use libfuzzer_sys::fuzz_target;

use reactive_trees::{Kind, Order, Tree};

// Any text either fails to load or loads into a tree that holds its invariants and survives a
// round trip.
fuzz_target!(|input: (Kind, &str)| {
    let (kind, text) = input;
    let Ok(tree) = Tree::deserialize(kind, text) else {
        return;
    };

    tree.assert_invariants();

    let again = Tree::deserialize(kind, &tree.serialize()).unwrap();
    assert_eq!(again.keys(Order::Pre), tree.keys(Order::Pre));
});

#![no_main]
use libfuzzer_sys::fuzz_target;

use reactive_trees::model::{run_btree_equivalence, EquivalenceInput};

fuzz_target!(|input: EquivalenceInput| { run_btree_equivalence(input.kind, input.ops) });

#![allow(missing_docs)]

mod common;

use canopy::{MemoryStore, NodeHandle, TreeEngine, TreeError};
use common::{assert_invariants, engine, fields, multi_engine};
use proptest::prelude::*;

/// Live node handles in ascending id order.
fn live_nodes(engine: &TreeEngine<MemoryStore>) -> Vec<NodeHandle> {
    let mut ids: Vec<u64> = engine
        .store()
        .snapshot_rows()
        .iter()
        .map(|row| row.id)
        .collect();
    ids.sort_unstable();
    ids.iter()
        .map(|&id| engine.node(id).expect("live node"))
        .collect()
}

/// Applies one scripted operation; refused operations are fine, anything
/// else must succeed.
fn apply(engine: &TreeEngine<MemoryStore>, op: u8, x: usize, y: usize, step: usize) {
    let nodes = live_nodes(engine);
    let pick = |index: usize| nodes.get(index % nodes.len().max(1)).cloned();

    let outcome: Result<(), TreeError> = match (op, pick(x), pick(y)) {
        (0, _, _) => engine
            .attach(fields(&format!("n{step}")))
            .as_root()
            .save()
            .map(drop),
        (1, Some(target), _) => engine
            .attach(fields(&format!("n{step}")))
            .first_child_of(&target)
            .save()
            .map(drop),
        (2, Some(target), _) => engine
            .attach(fields(&format!("n{step}")))
            .last_child_of(&target)
            .save()
            .map(drop),
        (3, Some(target), _) => engine
            .attach(fields(&format!("n{step}")))
            .prev_sibling_of(&target)
            .save()
            .map(drop),
        (4, Some(target), _) => engine
            .attach(fields(&format!("n{step}")))
            .next_sibling_of(&target)
            .save()
            .map(drop),
        (5, Some(subject), Some(target)) => {
            engine.relocate(&subject).last_child_of(&target).save()
        }
        (6, Some(subject), Some(target)) => {
            engine.relocate(&subject).prev_sibling_of(&target).save()
        }
        (7, Some(subject), _) => engine.delete_node(&subject),
        (_, Some(subject), _) => engine.delete_subtree(&subject).map(drop),
        _ => Ok(()),
    };

    match outcome {
        Ok(()) => {}
        // Structurally refused operations leave the table untouched.
        Err(TreeError::Conflict(_))
        | Err(TreeError::InvalidOperation(_))
        | Err(TreeError::NotFound(_)) => {}
        Err(other) => panic!("step {step}: unexpected engine failure: {other}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of attaches, moves, and deletes keeps the boundary
    /// encoding consistent.
    #[test]
    fn random_operation_sequences_preserve_the_encoding(
        ops in prop::collection::vec((0u8..9, 0usize..16, 0usize..16), 1..48),
    ) {
        let engine = engine();
        engine.attach(fields("root")).as_root().save().unwrap();
        for (step, &(op, x, y)) in ops.iter().enumerate() {
            apply(&engine, op, x, y, step);
            assert_invariants(&engine);
        }
    }

    /// The same holds per forest on a multi-tree model, roots included.
    #[test]
    fn random_sequences_preserve_every_forest(
        ops in prop::collection::vec((0u8..9, 0usize..16, 0usize..16), 1..48),
    ) {
        let engine = multi_engine();
        engine.attach(fields("one")).as_root().save().unwrap();
        engine.attach(fields("two")).as_root().save().unwrap();
        for (step, &(op, x, y)) in ops.iter().enumerate() {
            apply(&engine, op, x, y, step);
            assert_invariants(&engine);
        }
    }
}

/// A long zig-zag of moves over a wide tree settles into a consistent
/// shape without drift in the root's interval width.
#[test]
fn repeated_moves_do_not_leak_boundary_space() {
    let engine = engine();
    let root = engine.attach(fields("root")).as_root().save().unwrap();
    let mut leaves = Vec::new();
    for i in 0..8 {
        leaves.push(
            engine
                .attach(fields(&format!("leaf{i}")))
                .last_child_of(&root)
                .save()
                .unwrap(),
        );
    }
    let width_before = {
        let iv = engine.interval(&root).unwrap();
        iv.right - iv.left
    };

    for round in 0..32 {
        let subject = &leaves[round % 8];
        let target = &leaves[(round + 3) % 8];
        engine.relocate(subject).prev_sibling_of(target).save().unwrap();
        assert_invariants(&engine);
    }

    let iv = engine.interval(&root).unwrap();
    assert_eq!(iv.right - iv.left, width_before);
    assert_eq!(engine.count_descendants(&root).unwrap(), 8);
}

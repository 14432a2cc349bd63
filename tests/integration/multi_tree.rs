#![allow(missing_docs)]

mod common;

use canopy::{TreeError, Value};
use common::{assert_invariants, bounds, fields, multi_engine};

#[test]
fn root_attaches_auto_allocate_forest_ids() {
    let engine = multi_engine();
    let first = engine.attach(fields("one")).as_root().save().unwrap();
    let second = engine.attach(fields("two")).as_root().save().unwrap();

    assert_eq!(first.tree_value(engine.config()), Some(Value::Int(1)));
    assert_eq!(second.tree_value(engine.config()), Some(Value::Int(2)));
    assert_eq!(bounds(&engine, &first), (1, 2));
    assert_eq!(bounds(&engine, &second), (1, 2));
    assert_invariants(&engine);
}

#[test]
fn explicit_forest_id_is_honored_and_continues_the_sequence() {
    let engine = multi_engine();
    let pinned = engine
        .attach(fields("pinned"))
        .tree(7i64)
        .as_root()
        .save()
        .unwrap();
    let next = engine.attach(fields("next")).as_root().save().unwrap();

    assert_eq!(pinned.tree_value(engine.config()), Some(Value::Int(7)));
    assert_eq!(next.tree_value(engine.config()), Some(Value::Int(8)));
}

#[test]
fn duplicate_root_in_the_same_forest_is_refused() {
    let engine = multi_engine();
    engine
        .attach(fields("one"))
        .tree(1i64)
        .as_root()
        .save()
        .unwrap();
    let err = engine
        .attach(fields("again"))
        .tree(1i64)
        .as_root()
        .save()
        .unwrap_err();
    assert!(matches!(err, TreeError::Conflict(_)));
}

#[test]
fn root_lookup_requires_a_forest_id_on_multi_tree_models() {
    let engine = multi_engine();
    engine.attach(fields("one")).as_root().save().unwrap();

    let err = engine.root().unwrap_err();
    assert!(matches!(err, TreeError::InvalidOperation(_)));

    let found = engine.root_of(&Value::Int(1)).unwrap().unwrap();
    assert_eq!(found.field("title"), Some(Value::from("one")));
    assert!(engine.root_of(&Value::Int(9)).unwrap().is_none());
}

#[test]
fn roots_spans_every_forest() {
    let engine = multi_engine();
    engine.attach(fields("one")).as_root().save().unwrap();
    engine.attach(fields("two")).as_root().save().unwrap();
    engine.attach(fields("three")).as_root().save().unwrap();
    assert_eq!(engine.roots().unwrap().len(), 3);
}

#[test]
fn shifts_stay_inside_their_forest() {
    let engine = multi_engine();
    let left_root = engine.attach(fields("left")).as_root().save().unwrap();
    let right_root = engine.attach(fields("right")).as_root().save().unwrap();

    for title in ["a", "b", "c"] {
        engine
            .attach(fields(title))
            .last_child_of(&left_root)
            .save()
            .unwrap();
    }

    assert_eq!(bounds(&engine, &left_root), (1, 8));
    // The other forest never moved.
    assert_eq!(bounds(&engine, &right_root), (1, 2));
    assert_invariants(&engine);
}

#[test]
fn relative_attach_inherits_the_target_forest() {
    let engine = multi_engine();
    engine.attach(fields("one")).as_root().save().unwrap();
    let two = engine.attach(fields("two")).as_root().save().unwrap();
    let child = engine.attach(fields("kid")).last_child_of(&two).save().unwrap();
    assert_eq!(child.tree_value(engine.config()), Some(Value::Int(2)));
}

#[test]
fn relative_attach_with_a_mismatched_forest_is_refused() {
    let engine = multi_engine();
    let one = engine.attach(fields("one")).as_root().save().unwrap();
    let err = engine
        .attach(fields("kid"))
        .tree(2i64)
        .last_child_of(&one)
        .save()
        .unwrap_err();
    assert!(matches!(err, TreeError::Conflict(_)));
}

#[test]
fn cross_forest_moves_are_refused() {
    let engine = multi_engine();
    let one = engine.attach(fields("one")).as_root().save().unwrap();
    let two = engine.attach(fields("two")).as_root().save().unwrap();
    let stray = engine.attach(fields("stray")).last_child_of(&one).save().unwrap();

    let err = engine
        .relocate(&stray)
        .last_child_of(&two)
        .save()
        .unwrap_err();
    assert!(matches!(err, TreeError::Conflict(_)));
    // Nothing moved.
    assert_eq!(bounds(&engine, &one), (1, 4));
    assert_eq!(bounds(&engine, &two), (1, 2));
}

#[test]
fn same_tree_predicate_follows_the_discriminator() {
    let engine = multi_engine();
    let one = engine.attach(fields("one")).as_root().save().unwrap();
    let two = engine.attach(fields("two")).as_root().save().unwrap();
    let kid = engine.attach(fields("kid")).last_child_of(&one).save().unwrap();
    let nav = engine.navigator();
    assert!(nav.is_same_tree_as(&one, &kid).unwrap());
    assert!(!nav.is_same_tree_as(&one, &two).unwrap());
}

#[test]
fn deleting_a_whole_forest_leaves_the_others_intact() {
    let engine = multi_engine();
    let doomed = engine.attach(fields("doomed")).as_root().save().unwrap();
    engine.attach(fields("d1")).last_child_of(&doomed).save().unwrap();
    engine.attach(fields("d2")).last_child_of(&doomed).save().unwrap();
    let keeper = engine.attach(fields("keeper")).as_root().save().unwrap();
    engine.attach(fields("k1")).last_child_of(&keeper).save().unwrap();

    assert_eq!(engine.delete_subtree(&doomed).unwrap(), 3);

    assert_eq!(engine.roots().unwrap().len(), 1);
    assert_eq!(bounds(&engine, &keeper), (1, 4));
    assert_invariants(&engine);
}

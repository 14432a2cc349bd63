#![allow(missing_docs)]

mod common;

use std::collections::BTreeMap;

use canopy::{Cmp, ForestConfig, MemoryStore, NodeHandle, TreeEngine, TreeError};
use common::{engine, fields};

struct Fixture {
    engine: TreeEngine<MemoryStore>,
    root: NodeHandle,
    a: NodeHandle,
    a1: NodeHandle,
    a2: NodeHandle,
    a2x: NodeHandle,
    b: NodeHandle,
}

/// root(1,12) > a(2,9) > [a1(3,4), a2(5,8) > a2x(6,7)], b(10,11)
fn fixture() -> Fixture {
    let engine = engine();
    let root = engine.attach(fields("root")).as_root().save().unwrap();
    let a = engine.attach(fields("a")).last_child_of(&root).save().unwrap();
    let a1 = engine.attach(fields("a1")).last_child_of(&a).save().unwrap();
    let a2 = engine.attach(fields("a2")).last_child_of(&a).save().unwrap();
    let a2x = engine.attach(fields("a2x")).last_child_of(&a2).save().unwrap();
    let b = engine.attach(fields("b")).last_child_of(&root).save().unwrap();
    Fixture {
        engine,
        root,
        a,
        a1,
        a2,
        a2x,
        b,
    }
}

fn ids(nodes: &[NodeHandle]) -> Vec<u64> {
    nodes.iter().map(NodeHandle::id).collect()
}

#[test]
fn parent_walks_one_level_up() {
    let f = fixture();
    assert!(f.engine.parent(&f.root).unwrap().is_none());
    assert_eq!(f.engine.parent(&f.a).unwrap().unwrap().id(), f.root.id());
    assert_eq!(f.engine.parent(&f.a2x).unwrap().unwrap().id(), f.a2.id());
}

#[test]
fn children_come_back_in_tree_order() {
    let f = fixture();
    assert_eq!(
        ids(&f.engine.children(&f.root).unwrap()),
        vec![f.a.id(), f.b.id()]
    );
    assert_eq!(
        ids(&f.engine.children(&f.a).unwrap()),
        vec![f.a1.id(), f.a2.id()]
    );
    assert!(f.engine.children(&f.b).unwrap().is_empty());
}

#[test]
fn descendants_are_left_ordered() {
    let f = fixture();
    assert_eq!(
        ids(&f.engine.descendants(&f.root).unwrap()),
        vec![f.a.id(), f.a1.id(), f.a2.id(), f.a2x.id(), f.b.id()]
    );
}

#[test]
fn leaf_descendants_skip_containers() {
    let f = fixture();
    assert_eq!(
        ids(&f.engine.leaf_descendants(&f.root).unwrap()),
        vec![f.a1.id(), f.a2x.id(), f.b.id()]
    );
}

#[test]
fn ancestors_run_root_first() {
    let f = fixture();
    assert_eq!(
        ids(&f.engine.ancestors(&f.a2x).unwrap()),
        vec![f.root.id(), f.a.id(), f.a2.id()]
    );
    assert!(f.engine.ancestors(&f.root).unwrap().is_empty());
}

#[test]
fn siblings_include_the_subject() {
    let f = fixture();
    assert_eq!(
        ids(&f.engine.siblings(&f.a1).unwrap()),
        vec![f.a1.id(), f.a2.id()]
    );
    assert!(f.engine.siblings(&f.root).unwrap().is_empty());
}

#[test]
fn adjacent_siblings_resolve_by_shared_boundary() {
    let f = fixture();
    assert_eq!(f.engine.next_sibling(&f.a).unwrap().unwrap().id(), f.b.id());
    assert_eq!(
        f.engine.previous_sibling(&f.b).unwrap().unwrap().id(),
        f.a.id()
    );
    assert!(f.engine.previous_sibling(&f.a).unwrap().is_none());
    assert!(f.engine.next_sibling(&f.b).unwrap().is_none());
}

#[test]
fn first_and_last_child() {
    let f = fixture();
    assert_eq!(f.engine.first_child(&f.a).unwrap().unwrap().id(), f.a1.id());
    assert_eq!(f.engine.last_child(&f.a).unwrap().unwrap().id(), f.a2.id());
    assert!(f.engine.first_child(&f.b).unwrap().is_none());
}

#[test]
fn depth_counts_strict_containers() {
    let f = fixture();
    assert_eq!(f.engine.depth(&f.root).unwrap(), 0);
    assert_eq!(f.engine.depth(&f.a).unwrap(), 1);
    assert_eq!(f.engine.depth(&f.a2x).unwrap(), 3);
}

#[test]
fn counts_follow_the_encoding() {
    let f = fixture();
    assert_eq!(f.engine.count_children(&f.root).unwrap(), 2);
    assert_eq!(f.engine.count_descendants(&f.root).unwrap(), 5);
    assert_eq!(f.engine.count_descendants(&f.a).unwrap(), 3);
    assert_eq!(f.engine.count_descendants(&f.b).unwrap(), 0);
}

#[test]
fn navigator_predicates() {
    let f = fixture();
    let nav = f.engine.navigator();
    assert!(nav.is_root(&f.root).unwrap());
    assert!(!nav.is_root(&f.a).unwrap());
    assert!(nav.is_leaf(&f.b).unwrap());
    assert!(!nav.is_leaf(&f.a).unwrap());
    assert!(nav.is_child(&f.a2x).unwrap());
    assert!(!nav.is_child(&f.root).unwrap());
    assert!(nav.has_children(&f.a).unwrap());
    assert!(!nav.has_children(&f.b).unwrap());
    assert!(!nav.has_parent(&f.root).unwrap());
    assert!(nav.has_parent(&f.a2x).unwrap());
    assert!(nav.has_next_sibling(&f.a).unwrap());
    assert!(!nav.has_previous_sibling(&f.a).unwrap());
    assert!(nav.is_ancestor_of(&f.root, &f.a2x).unwrap());
    assert!(!nav.is_ancestor_of(&f.a2x, &f.root).unwrap());
    assert!(nav.is_descendant_of(&f.a2x, &f.a).unwrap());
    assert!(nav.is_parent_of(&f.a2, &f.a2x).unwrap());
    assert!(!nav.is_parent_of(&f.a, &f.a2x).unwrap());
    assert!(nav.is_child_of(&f.a1, &f.a).unwrap());
}

#[test]
fn path_joins_titles_with_the_delimiter() {
    let f = fixture();
    assert_eq!(f.engine.path(&f.a2x, true).unwrap(), "root/a/a2/a2x");
    assert_eq!(f.engine.path(&f.a2x, false).unwrap(), "a/a2/a2x");
    assert_eq!(f.engine.path(&f.root, true).unwrap(), "root");
}

#[test]
fn path_respects_a_custom_delimiter() {
    let engine = TreeEngine::open(
        MemoryStore::new(),
        ForestConfig::new().title("title").path_delimiter(" > "),
    )
    .unwrap();
    let root = engine.attach(fields("top")).as_root().save().unwrap();
    let leaf = engine.attach(fields("leaf")).last_child_of(&root).save().unwrap();
    assert_eq!(engine.path(&leaf, true).unwrap(), "top > leaf");
}

#[test]
fn path_without_a_title_column_is_a_configuration_error() {
    let engine = TreeEngine::open(MemoryStore::new(), ForestConfig::new()).unwrap();
    let root = engine.attach(BTreeMap::new()).as_root().save().unwrap();
    let err = engine.path(&root, true).unwrap_err();
    assert!(matches!(err, TreeError::Configuration(_)));
}

#[test]
fn roots_lists_the_single_root() {
    let f = fixture();
    assert_eq!(ids(&f.engine.roots().unwrap()), vec![f.root.id()]);
}

#[test]
fn descendants_query_can_be_refined() {
    let f = fixture();
    let query = f
        .engine
        .descendants_query(&f.root)
        .unwrap()
        .filter("title", Cmp::Eq, "a2x");
    let hits = f.engine.fetch(&query).unwrap();
    assert_eq!(ids(&hits), vec![f.a2x.id()]);
}

#[test]
fn dump_tree_nests_children_in_order() {
    let f = fixture();
    let dump = f.engine.dump_tree(&f.root).unwrap();
    assert_eq!(dump.id, f.root.id());
    assert_eq!(dump.children.len(), 2);
    let da = &dump.children[0];
    assert_eq!(da.id, f.a.id());
    assert_eq!(da.children.len(), 2);
    assert_eq!(da.children[0].id, f.a1.id());
    assert_eq!(da.children[1].id, f.a2.id());
    assert_eq!(da.children[1].children[0].id, f.a2x.id());
    assert_eq!(dump.children[1].id, f.b.id());
    assert!(dump.children[1].children.is_empty());
}

#[test]
fn dump_tree_builds_display_paths() {
    let f = fixture();
    let dump = f.engine.dump_tree(&f.root).unwrap();
    assert_eq!(dump.path.as_deref(), Some("/"));
    let da = &dump.children[0];
    assert_eq!(da.path.as_deref(), Some("/a"));
    assert_eq!(da.children[1].children[0].path.as_deref(), Some("/a/a2/a2x"));
}

#[test]
fn dump_tree_serializes_to_json() {
    let f = fixture();
    let dump = f.engine.dump_tree(&f.a).unwrap();
    let json = serde_json::to_value(&dump).unwrap();
    assert_eq!(json["id"], serde_json::json!(f.a.id()));
    assert_eq!(json["children"][0]["fields"]["title"]["v"], "a1");
    assert_eq!(json["path"], "/");
}

#[test]
fn dump_tree_without_titles_omits_paths() {
    let engine = TreeEngine::open(MemoryStore::new(), ForestConfig::new()).unwrap();
    let root = engine.attach(BTreeMap::new()).as_root().save().unwrap();
    engine.attach(BTreeMap::new()).last_child_of(&root).save().unwrap();
    let dump = engine.dump_tree(&root).unwrap();
    assert!(dump.path.is_none());
    let json = serde_json::to_value(&dump).unwrap();
    assert!(json.get("path").is_none());
    assert!(json["children"][0].get("path").is_none());
}

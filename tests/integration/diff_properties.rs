//! Property-based and scenario tests for tree diffing

use hashpatch::diff::{diff, flatten, ChangeSet};
use hashpatch::tree::{HashNode, HashTree};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

fn tree(value: serde_json::Value) -> HashTree {
    serde_json::from_value(value).unwrap()
}

fn segment() -> impl Strategy<Value = String> {
    "[a-e]{1,3}"
}

fn node() -> impl Strategy<Value = HashNode> {
    let leaf = "[0-9a-f]{4}".prop_map(HashNode::Leaf);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map(segment(), inner, 1..4).prop_map(HashNode::Interior)
    })
}

fn hash_tree() -> impl Strategy<Value = HashTree> {
    prop::collection::btree_map(segment(), node(), 0..5).prop_map(HashTree::from_root)
}

proptest! {
    #[test]
    fn test_diff_with_itself_is_empty(t in hash_tree()) {
        prop_assert!(diff(&t, &t).is_empty());
    }

    #[test]
    fn test_diff_from_empty_is_flatten(t in hash_tree()) {
        let changes = diff(&HashTree::new(), &t);
        prop_assert_eq!(changes.into_inner(), flatten(&t));
    }

    #[test]
    fn test_diff_entries_come_from_new_and_differ_from_old(old in hash_tree(), new in hash_tree()) {
        let old_flat = flatten(&old);
        let new_flat = flatten(&new);
        let changes = diff(&old, &new);

        for (path, hash) in changes.iter() {
            prop_assert_eq!(new_flat.get(path).map(String::as_str), Some(hash));
            prop_assert_ne!(old_flat.get(path).map(String::as_str), Some(hash));
        }
        for (path, hash) in &new_flat {
            if old_flat.get(path) != Some(hash) {
                prop_assert!(changes.contains(path));
            }
        }
    }

    #[test]
    fn test_flatten_counts_every_leaf(t in hash_tree()) {
        prop_assert_eq!(flatten(&t).len(), t.file_count());
    }
}

/// Test the canonical local/remote scenario
#[test]
fn test_modified_and_added_files() {
    let local = tree(json!({"a": "h1", "dir": {"b": "h2"}}));
    let remote = tree(json!({"a": "h1", "dir": {"b": "h3"}, "c": "h4"}));

    let changes = diff(&local, &remote);

    let expected: ChangeSet = [
        ("dir/b".to_string(), "h3".to_string()),
        ("c".to_string(), "h4".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(changes, expected);
}

/// Test that files only present locally are never reported
#[test]
fn test_local_only_files_are_ignored() {
    let local = tree(json!({"a": "h1", "stale.dll": "h9", "dir": {"old": "h8"}}));
    let remote = tree(json!({"a": "h1"}));

    assert!(diff(&local, &remote).is_empty());
}

/// Test that a file replaced by a directory reports the directory's files
#[test]
fn test_file_replaced_by_directory() {
    let local = tree(json!({"plugins": "h1"}));
    let remote = tree(json!({"plugins": {"a.dll": "h2", "b.dll": "h3"}}));

    let changes = diff(&local, &remote);

    assert_eq!(changes.len(), 2);
    assert_eq!(changes.get("plugins/a.dll"), Some("h2"));
    assert_eq!(changes.get("plugins/b.dll"), Some("h3"));
}

/// Test that flattened paths use forward slashes at every depth
#[test]
fn test_flatten_joins_with_slashes() {
    let t = tree(json!({"a": {"b": {"c": "h1"}}, "d": "h2"}));

    let flat = flatten(&t);

    let expected: BTreeMap<String, String> = [
        ("a/b/c".to_string(), "h1".to_string()),
        ("d".to_string(), "h2".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(flat, expected);
}

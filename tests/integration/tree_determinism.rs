//! Integration tests for tree building determinism and exclusions

use crate::integration::test_utils::write_files;
use hashpatch::diff::{diff, flatten};
use hashpatch::tree::builder::{self, TreeBuilder};
use hashpatch::tree::hasher::compute_content_hash;
use hashpatch::tree::{ExclusionSet, HashNode};
use std::fs;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_files(
        temp_dir.path(),
        &[
            ("app.exe", "binary"),
            ("lib/core.dll", "core"),
            ("lib/plugins/a.dll", "plugin a"),
            ("lib/plugins/b.dll", "plugin b"),
            ("data/strings.json", "{}"),
            ("config/settings.ini", "user settings"),
            ("debug/local.json", "{}"),
        ],
    );
    temp_dir
}

/// Test that the same filesystem produces the same tree
#[test]
fn test_same_filesystem_same_tree() {
    let temp_dir = fixture();
    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());

    let tree1 = builder.build().unwrap();
    let tree2 = builder.build().unwrap();

    assert_eq!(tree1, tree2);
    assert_eq!(
        serde_json::to_string(&tree1).unwrap(),
        serde_json::to_string(&tree2).unwrap()
    );
}

/// Test that parallel and serial hashing agree
#[test]
fn test_parallel_matches_serial() {
    let temp_dir = fixture();
    let root = temp_dir.path().to_path_buf();

    let parallel = TreeBuilder::new(root.clone())
        .with_parallel_hashing(true)
        .build()
        .unwrap();
    let serial = TreeBuilder::new(root)
        .with_parallel_hashing(false)
        .build()
        .unwrap();

    assert_eq!(parallel, serial);
}

/// Test that leaves carry the content hash of the file bytes
#[test]
fn test_leaf_hashes_match_content() {
    let temp_dir = fixture();
    let tree = TreeBuilder::new(temp_dir.path().to_path_buf()).build().unwrap();

    assert_eq!(
        tree.get("lib/plugins/a.dll"),
        Some(&HashNode::Leaf(compute_content_hash(b"plugin a")))
    );
    assert_eq!(tree.file_count(), 5);
}

/// Test that a content change only changes that file's leaf
#[test]
fn test_file_content_change_changes_only_its_leaf() {
    let temp_dir = fixture();
    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());
    let before = builder.build().unwrap();

    fs::write(temp_dir.path().join("lib/core.dll"), "core v2").unwrap();
    let after = builder.build().unwrap();

    assert_ne!(before.get("lib/core.dll"), after.get("lib/core.dll"));
    assert_eq!(before.get("lib/plugins"), after.get("lib/plugins"));
    assert_eq!(before.get("app.exe"), after.get("app.exe"));
}

/// Test that default exclusions drop the config and debug subtrees only
#[test]
fn test_default_exclusions_are_segment_exact() {
    let temp_dir = fixture();
    write_files(
        temp_dir.path(),
        &[
            ("configX/keep.txt", "kept"),
            ("debugger.exe", "kept"),
            ("data/config/nested.ini", "kept"),
        ],
    );

    let tree = TreeBuilder::new(temp_dir.path().to_path_buf()).build().unwrap();

    assert!(tree.get("config").is_none());
    assert!(tree.get("debug").is_none());
    assert!(tree.get("configX/keep.txt").is_some());
    assert!(tree.get("debugger.exe").is_some());
    assert!(tree.get("data/config/nested.ini").is_some());
}

/// Test that an empty exclusion set includes everything
#[test]
fn test_no_exclusions_includes_everything() {
    let temp_dir = fixture();
    let tree = builder::build(temp_dir.path(), ExclusionSet::none()).unwrap();

    assert!(tree.get("config/settings.ini").is_some());
    assert!(tree.get("debug/local.json").is_some());
    assert_eq!(tree.file_count(), 7);
}

/// Test that empty directories produce no entry
#[test]
fn test_empty_directories_have_no_entry() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("empty/nested")).unwrap();
    write_files(temp_dir.path(), &[("file.txt", "x")]);

    let tree = TreeBuilder::new(temp_dir.path().to_path_buf()).build().unwrap();

    assert!(tree.get("empty").is_none());
    assert_eq!(tree.root().len(), 1);
}

/// Test that an empty root yields an empty tree
#[test]
fn test_empty_root() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TreeBuilder::new(temp_dir.path().to_path_buf()).build().unwrap();

    assert!(tree.is_empty());
    assert_eq!(serde_json::to_string(&tree).unwrap(), "{}");
}

/// Test that a missing root is an error
#[test]
fn test_missing_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = TreeBuilder::new(temp_dir.path().join("absent")).build();
    assert!(result.is_err());
}

/// Test that symlinked directories are followed and hashed as content
#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_followed() {
    let temp_dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    write_files(outside.path(), &[("shared.dat", "shared")]);
    write_files(temp_dir.path(), &[("app.exe", "binary")]);
    std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("shared")).unwrap();

    let tree = TreeBuilder::new(temp_dir.path().to_path_buf()).build().unwrap();

    assert_eq!(
        tree.get("shared/shared.dat"),
        Some(&HashNode::Leaf(compute_content_hash(b"shared")))
    );
}

/// Test that diffing a build against itself is empty
#[test]
fn test_diff_of_identical_builds_is_empty() {
    let temp_dir = fixture();
    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());

    let changes = diff(&builder.build().unwrap(), &builder.build().unwrap());

    assert!(changes.is_empty());
}

/// Test that adding, changing and removing files map to the expected entries
#[test]
fn test_single_file_edits_against_previous_build() {
    let temp_dir = fixture();
    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());
    let before = builder.build().unwrap();

    write_files(temp_dir.path(), &[("lib/new.dll", "new")]);
    let added = builder.build().unwrap();
    let changes = diff(&before, &added);
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes.get("lib/new.dll"),
        Some(compute_content_hash(b"new").as_str())
    );

    write_files(temp_dir.path(), &[("app.exe", "binary v2")]);
    let changed = builder.build().unwrap();
    let changes = diff(&added, &changed);
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes.get("app.exe"),
        Some(compute_content_hash(b"binary v2").as_str())
    );

    fs::remove_file(temp_dir.path().join("data/strings.json")).unwrap();
    let removed = builder.build().unwrap();
    assert!(diff(&changed, &removed).is_empty());
}

/// Test that no flattened path falls under an excluded name
#[test]
fn test_flattened_paths_skip_excluded_subtree() {
    let temp_dir = fixture();
    write_files(temp_dir.path(), &[("dataX/keep.bin", "k")]);

    let tree = builder::build(temp_dir.path(), ExclusionSet::new(["data"])).unwrap();
    let flat = flatten(&tree);

    assert!(!flat.keys().any(|path| path.starts_with("data/")));
    assert!(flat.contains_key("dataX/keep.bin"));
    // replacing the defaults brings config/ and debug/ back
    assert!(flat.contains_key("config/settings.ini"));
}

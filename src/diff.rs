//! Tree diffing
//!
//! Flattens two hash trees into `/`-joined path maps and reports every path of
//! the new tree whose hash is absent from, or different in, the old tree.
//! The diff is one-directional: it answers "what must be fetched", so paths
//! that only exist in the old tree never show up.

use crate::tree::node::{HashNode, HashTree};
use crate::types::{ContentHash, FlatPathMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Paths that must be fetched, mapped to their new content hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(FlatPathMap);

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, h)| (p.as_str(), h.as_str()))
    }

    pub fn into_inner(self) -> FlatPathMap {
        self.0
    }
}

impl FromIterator<(String, ContentHash)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (String, ContentHash)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ChangeSet {
    type Item = (String, ContentHash);
    type IntoIter = std::collections::btree_map::IntoIter<String, ContentHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Flatten a tree into a `/`-joined path to hash mapping
pub fn flatten(tree: &HashTree) -> FlatPathMap {
    let mut flat = BTreeMap::new();
    flatten_into(tree.root(), "", &mut flat);
    flat
}

fn flatten_into(children: &BTreeMap<String, HashNode>, prefix: &str, out: &mut FlatPathMap) {
    for (segment, node) in children {
        let path = format!("{}{}", prefix, segment);
        match node {
            HashNode::Leaf(hash) => {
                out.insert(path, hash.clone());
            }
            HashNode::Interior(grandchildren) => {
                flatten_into(grandchildren, &format!("{}/", path), out);
            }
        }
    }
}

/// Compute the paths of `new` that are missing from or changed in `old`
pub fn diff(old: &HashTree, new: &HashTree) -> ChangeSet {
    let old_flat = flatten(old);
    flatten(new)
        .into_iter()
        .filter(|(path, new_hash)| old_flat.get(path) != Some(new_hash))
        .collect()
}

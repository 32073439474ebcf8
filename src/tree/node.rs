//! Hash tree node types

use crate::types::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in a hash tree: either a file's content hash or a directory's children.
///
/// Serializes as the nested-object shape the update service speaks: a leaf is a
/// JSON string, an interior node is a JSON object keyed by path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HashNode {
    Leaf(ContentHash),
    Interior(BTreeMap<String, HashNode>),
}

impl HashNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, HashNode::Leaf(_))
    }

    /// Content hash if this node is a leaf
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            HashNode::Leaf(hash) => Some(hash),
            HashNode::Interior(_) => None,
        }
    }

    /// Children if this node is an interior node
    pub fn as_interior(&self) -> Option<&BTreeMap<String, HashNode>> {
        match self {
            HashNode::Leaf(_) => None,
            HashNode::Interior(children) => Some(children),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            HashNode::Leaf(_) => 1,
            HashNode::Interior(children) => children.values().map(HashNode::leaf_count).sum(),
        }
    }
}

/// Nested mapping from path segment to [`HashNode`], rooted at an interior node.
///
/// Built once and never mutated afterwards; diffing compares two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashTree {
    root: BTreeMap<String, HashNode>,
}

impl HashTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing root mapping
    pub fn from_root(root: BTreeMap<String, HashNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &BTreeMap<String, HashNode> {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of files (leaves) in the tree
    pub fn file_count(&self) -> usize {
        self.root.values().map(HashNode::leaf_count).sum()
    }

    /// Look up a node by its `/`-joined relative path
    pub fn get(&self, path: &str) -> Option<&HashNode> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut node = self.root.get(segments.next()?)?;
        for segment in segments {
            node = node.as_interior()?.get(segment)?;
        }
        Some(node)
    }

    /// Set the leaf at `segments`, creating interior nodes along the way.
    ///
    /// A leaf sitting where an interior node is needed is replaced; the
    /// filesystem cannot produce that shape, so last write wins.
    pub(crate) fn insert_leaf(&mut self, segments: &[String], hash: ContentHash) {
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| HashNode::Interior(BTreeMap::new()));
            if entry.is_leaf() {
                *entry = HashNode::Interior(BTreeMap::new());
            }
            let HashNode::Interior(children) = entry else {
                return;
            };
            current = children;
        }
        current.insert(last.clone(), HashNode::Leaf(hash));
    }
}

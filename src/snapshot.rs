//! Hash tree JSON snapshots
//!
//! The local tree can be dumped for inspection as a nested JSON object with
//! two-space indentation. The update flow never reads these back; loading is
//! only offered for offline comparison of two dumps.

use crate::error::UpdateError;
use crate::tree::node::HashTree;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Render a tree as pretty JSON (two-space indent, trailing newline)
pub fn to_json_pretty(tree: &HashTree) -> Result<String, UpdateError> {
    let mut json = serde_json::to_string_pretty(tree)
        .map_err(|e| UpdateError::Snapshot(format!("Failed to serialize tree: {}", e)))?;
    json.push('\n');
    Ok(json)
}

/// Write a tree snapshot to `path`, creating parent directories
pub fn write_snapshot(tree: &HashTree, path: &Path) -> Result<(), UpdateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            UpdateError::Snapshot(format!(
                "Failed to create snapshot directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let json = to_json_pretty(tree)?;
    fs::write(path, json).map_err(|e| {
        UpdateError::Snapshot(format!(
            "Failed to write snapshot {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), "Wrote tree snapshot");
    Ok(())
}

/// Load a tree from a JSON document
///
/// Accepts either a bare tree or the service's `{"metadata": {...}}` envelope.
pub fn load_tree(path: &Path) -> Result<HashTree, UpdateError> {
    let content = fs::read_to_string(path).map_err(|e| {
        UpdateError::Snapshot(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let mut value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        UpdateError::Snapshot(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    let envelope = value
        .get_mut("metadata")
        .filter(|m| m.is_object())
        .map(serde_json::Value::take);
    if let Some(metadata) = envelope {
        value = metadata;
    }

    serde_json::from_value(value).map_err(|e| {
        UpdateError::Snapshot(format!(
            "{} is not a hash tree: {}",
            path.display(),
            e
        ))
    })
}

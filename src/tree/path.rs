//! Path canonicalization and segment splitting utilities

use crate::error::TreeError;
use std::path::{Component, Path, PathBuf};

/// Canonicalize the installation root
///
/// Uses dunce so Windows roots stay in their plain drive-letter form and the
/// relative paths computed from them never pick up a `\\?\` prefix.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, TreeError> {
    dunce::canonicalize(path).map_err(|e| TreeError::io(path, e))
}

/// Split `path` into segments relative to `root`
///
/// Returns `None` for the root itself. Empty, `.` and root/prefix components
/// are dropped so a stray separator never becomes a key.
pub fn relative_segments(root: &Path, path: &Path) -> Result<Option<Vec<String>>, TreeError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        TreeError::InvalidPath(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    TreeError::InvalidPath(format!("non UTF-8 path: {}", path.display()))
                })?;
                if !name.is_empty() {
                    segments.push(name.to_string());
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(TreeError::InvalidPath(format!(
                    "parent component in {}",
                    path.display()
                )));
            }
        }
    }

    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments))
    }
}

/// Join segments the way flattened paths and the update service spell them
pub fn join_segments(segments: &[String]) -> String {
    segments.join("/")
}

//! Filesystem walker for collecting installation files

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::{DirEntry, WalkDir};

/// Top-level names never included in a fingerprint
///
/// Matching is exact on the first relative path segment, so excluding
/// `config` leaves a sibling `configX` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet(BTreeSet<String>);

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .map(Into::into)
                .map(|name: String| name.trim_matches(|c| c == '/' || c == '\\').to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether a top-level segment is excluded
    pub fn contains(&self, segment: &str) -> bool {
        self.0.contains(segment)
    }

    /// Whether a relative path (as segments) falls in an excluded subtree
    pub fn excludes(&self, segments: &[String]) -> bool {
        segments.first().is_some_and(|first| self.contains(first))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ExclusionSet {
    /// User configuration and debug output never ship with a release
    fn default() -> Self {
        Self::new(["config", "debug"])
    }
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links and hash their targets (default: true)
    pub follow_symlinks: bool,
    /// Top-level subtrees to skip
    pub exclusions: ExclusionSet,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            exclusions: ExclusionSet::default(),
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and collect every file outside the exclusions
    ///
    /// Returns file paths sorted for determinism. Any unreadable entry, or an
    /// entry that is neither a file nor a directory, fails the whole walk.
    pub fn walk(&self) -> Result<Vec<PathBuf>, TreeError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                let message = e.to_string();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message));
                TreeError::io(path, source)
            })?;

            // Skip the root directory itself (we only want its contents)
            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_file() {
                trace!(path = %entry.path().display(), "Found file");
                files.push(entry.into_path());
                continue;
            }

            return Err(TreeError::io(
                entry.path(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "not a regular file or directory",
                ),
            ));
        }

        files.sort();
        Ok(files)
    }

    /// Excluded names only apply directly below the root
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() == 1
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.exclusions.contains(name))
    }
}

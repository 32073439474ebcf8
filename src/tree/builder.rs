//! Tree builder for fingerprinting an installation directory

use crate::error::TreeError;
use crate::tree::hasher;
use crate::tree::node::HashTree;
use crate::tree::path;
use crate::tree::walker::{ExclusionSet, Walker, WalkerConfig};
use crate::types::ContentHash;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace};

/// Tree builder for constructing hash trees from the filesystem
pub struct TreeBuilder {
    root: PathBuf,
    walker_config: WalkerConfig,
    parallel: bool,
}

impl TreeBuilder {
    /// Create a new tree builder for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: WalkerConfig::default(),
            parallel: true,
        }
    }

    /// Replace the default exclusions (`config`, `debug`)
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.walker_config.exclusions = exclusions;
        self
    }

    /// Follow symbolic links and hash their targets (default), or fail on them
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.walker_config.follow_symlinks = follow;
        self
    }

    /// Hash files on the rayon pool (default) or on the calling thread
    pub fn with_parallel_hashing(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the hash tree for the root directory
    ///
    /// Any unreadable file aborts the build; a partial fingerprint is never
    /// returned.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn build(&self) -> Result<HashTree, TreeError> {
        let start = Instant::now();
        info!("Starting tree build");

        let root = path::canonicalize_root(&self.root)?;

        // Step 1: Walk filesystem and collect files
        let walker = Walker::with_config(root.clone(), self.walker_config.clone());
        let files = match walker.walk() {
            Ok(files) => {
                debug!(file_count = files.len(), "Walked filesystem");
                files
            }
            Err(e) => {
                error!("Filesystem walk failed: {}", e);
                return Err(e);
            }
        };

        // Step 2: Resolve tree keys, dropping the root and excluded subtrees
        let mut keyed = Vec::with_capacity(files.len());
        for file_path in files {
            let Some(segments) = path::relative_segments(&root, &file_path)? else {
                continue;
            };
            if self.walker_config.exclusions.excludes(&segments) {
                trace!(path = %file_path.display(), "Skipping excluded file");
                continue;
            }
            keyed.push((file_path, segments));
        }

        // Step 3: Hash contents; each worker owns its own digest context
        let hash_one = |(file_path, segments): &(PathBuf, Vec<String>)| {
            hash_entry(file_path, segments)
        };
        let hashed: Vec<(Vec<String>, ContentHash)> = if self.parallel {
            keyed.par_iter().map(hash_one).collect::<Result<_, _>>()?
        } else {
            keyed.iter().map(hash_one).collect::<Result<_, _>>()?
        };

        // Step 4: Merge serially into the tree
        let mut tree = HashTree::new();
        for (segments, content_hash) in hashed {
            tree.insert_leaf(&segments, content_hash);
        }

        info!(
            file_count = tree.file_count(),
            duration_ms = start.elapsed().as_millis(),
            "Tree build completed"
        );

        Ok(tree)
    }
}

/// Hash a single file, logging the failing path before propagating
fn hash_entry(
    file_path: &std::path::Path,
    segments: &[String],
) -> Result<(Vec<String>, ContentHash), TreeError> {
    match hasher::hash_file(file_path) {
        Ok(content_hash) => {
            trace!(path = %path::join_segments(segments), %content_hash, "Hashed file");
            Ok((segments.to_vec(), content_hash))
        }
        Err(e) => {
            error!("Failed to hash file: {}", e);
            Err(e)
        }
    }
}

/// Build a hash tree with the given exclusions and default settings
pub fn build(root: impl Into<PathBuf>, exclusions: ExclusionSet) -> Result<HashTree, TreeError> {
    TreeBuilder::new(root.into())
        .with_exclusions(exclusions)
        .build()
}

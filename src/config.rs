//! Configuration System
//!
//! Layered configuration for the update client: built-in defaults, a global
//! user file, a file shipped in the installation's `config/` directory, and
//! environment overrides. CLI flags are applied on top by the binary.

use crate::gateway::GatewayConfig;
use crate::logging::LoggingConfig;
use crate::orchestrator::UpdateOptions;
use crate::platform::PlatformTag;
use crate::tree::walker::ExclusionSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Update service connection
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Update run behavior
    #[serde(default)]
    pub update: UpdateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Update run behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Top-level names left out of fingerprints
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,

    /// Maximum concurrent download-link requests
    #[serde(default = "default_link_concurrency")]
    pub link_concurrency: usize,

    /// Hash files in parallel
    #[serde(default = "default_true")]
    pub parallel_hashing: bool,

    /// Hash symlink targets; when off, a symlink fails the fingerprint
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,

    /// Dump the local tree as JSON during update runs
    #[serde(default = "default_true")]
    pub snapshot: bool,

    /// Snapshot location, relative to the installation root unless absolute
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// File holding the installed version, relative to the installation root unless absolute
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,
}

fn default_exclusions() -> Vec<String> {
    ExclusionSet::default().iter().map(str::to_string).collect()
}

fn default_link_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("debug").join("local.json")
}

fn default_version_file() -> PathBuf {
    PathBuf::from("version.txt")
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            exclusions: default_exclusions(),
            link_concurrency: default_link_concurrency(),
            parallel_hashing: default_true(),
            follow_symlinks: default_true(),
            snapshot: default_true(),
            snapshot_path: default_snapshot_path(),
            version_file: default_version_file(),
        }
    }
}

impl UpdateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.link_concurrency == 0 {
            return Err("link_concurrency must be at least 1".to_string());
        }
        if self
            .exclusions
            .iter()
            .any(|name| name.contains('/') || name.contains('\\'))
        {
            return Err("exclusions must be single top-level names".to_string());
        }
        if self.snapshot && self.snapshot_path.as_os_str().is_empty() {
            return Err("snapshot_path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Gateway(String),
    Update(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Gateway(msg) => write!(f, "Gateway: {}", msg),
            ValidationError::Update(msg) => write!(f, "Update: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl UpdaterConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.gateway.validate() {
            errors.push(ValidationError::Gateway(e));
        }
        if let Err(e) = self.update.validate() {
            errors.push(ValidationError::Update(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Orchestrator settings for an installation at `root`
    pub fn update_options(&self, root: &Path) -> UpdateOptions {
        UpdateOptions {
            root: root.to_path_buf(),
            exclusions: ExclusionSet::new(self.update.exclusions.iter().cloned()),
            parallel_hashing: self.update.parallel_hashing,
            follow_symlinks: self.update.follow_symlinks,
            link_concurrency: self.update.link_concurrency,
            snapshot_path: self
                .update
                .snapshot
                .then(|| resolve_under(root, &self.update.snapshot_path)),
            platform: PlatformTag::current(),
        }
    }

    /// Version file location for an installation at `root`
    pub fn version_file(&self, root: &Path) -> PathBuf {
        resolve_under(root, &self.update.version_file)
    }
}

fn resolve_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

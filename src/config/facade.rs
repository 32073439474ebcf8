//! Config loader: assembles defaults, files and environment into [`UpdaterConfig`].

use super::merge::merge_policy;
use super::sources::{global_file, install_file};
use super::UpdaterConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

/// Entry point for configuration loading
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for an installation root.
    ///
    /// Precedence (lowest to highest): defaults, global file, install-root
    /// file, `HASHPATCH__*` environment variables.
    pub fn load(root: &Path) -> Result<UpdaterConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = install_file::add_to_builder(builder, root)?;
        let builder = merge_policy::add_environment(builder);
        builder.build()?.try_deserialize()
    }

    /// Load configuration from an explicit file, skipping global and
    /// install-root files. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<UpdaterConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = merge_policy::add_environment(builder);
        builder.build()?.try_deserialize()
    }

    /// Path of the global config file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Path of the install-root config file
    pub fn install_config_path(root: &Path) -> PathBuf {
        install_file::install_config_path(root)
    }
}

//! Install-root config file source: <root>/config/hashpatch.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

/// Path of the config file shipped alongside an installation.
///
/// Lives under `config/`, which is excluded from fingerprints, so local
/// edits never show up as changes.
pub fn install_config_path(root: &Path) -> PathBuf {
    root.join("config").join("hashpatch.toml")
}

/// Add the install-root config file to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = install_config_path(root);
    if path.exists() {
        return Ok(builder.add_source(File::from(path).required(false)));
    }
    Ok(builder)
}

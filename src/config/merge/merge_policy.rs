//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("gateway.base_url", crate::gateway::DEFAULT_BASE_URL)?
        .set_default("gateway.connect_timeout_secs", 10)?
        .set_default("gateway.request_timeout_secs", 60)?
        .set_default("gateway.system_proxy", true)?
        .set_default("update.exclusions", vec!["config", "debug"])?
        .set_default("update.link_concurrency", 4)?
        .set_default("update.parallel_hashing", true)?
        .set_default("update.follow_symlinks", true)?
        .set_default("update.snapshot", true)?
        .set_default("update.snapshot_path", "debug/local.json")?
        .set_default("update.version_file", "version.txt")?)
}

/// Environment overrides, applied last: `HASHPATCH__UPDATE__LINK_CONCURRENCY=8`.
/// `update.exclusions` accepts a comma-separated list.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("HASHPATCH")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("update.exclusions"),
    )
}

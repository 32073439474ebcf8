//! CLI route: run context and the single route table. Dispatches to the
//! orchestrator, tree builder and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{format_change_set, format_update_json, format_update_text};
use crate::config::{ConfigLoader, UpdaterConfig};
use crate::diff;
use crate::error::UpdateError;
use crate::gateway::HttpGateway;
use crate::orchestrator::{UpdateOrchestrator, UpdateOutcome};
use crate::snapshot;
use crate::tree::builder::TreeBuilder;
use crate::version;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Exit code when some changed files have no resolvable download
pub const EXIT_PARTIAL: i32 = 2;

/// Rendered command result and the process exit code it maps to
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, exit_code: 0 }
    }
}

/// Runtime context for CLI execution: installation root and loaded config.
pub struct RunContext {
    root: PathBuf,
    config: UpdaterConfig,
}

impl RunContext {
    /// Load and validate configuration for an installation at `root`
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, UpdateError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            UpdateError::Config(format!("Invalid configuration: {}", messages.join("; ")))
        })?;
        debug!(root = %root.display(), "Loaded configuration");
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, UpdateError> {
        match command {
            Commands::Update {
                current_version,
                version_file,
                snapshot,
                no_snapshot,
                base_url,
                format,
            } => self.handle_update(
                current_version.as_deref(),
                version_file.as_deref(),
                snapshot.as_deref(),
                *no_snapshot,
                base_url.as_deref(),
                format,
            ),
            Commands::Fingerprint { output } => self.handle_fingerprint(output.as_deref()),
            Commands::Diff { old, new, format } => self.handle_diff(old, new, format),
            Commands::Config => self.handle_config(),
        }
    }

    fn handle_update(
        &self,
        current_version: Option<&str>,
        version_file: Option<&Path>,
        snapshot_path: Option<&Path>,
        no_snapshot: bool,
        base_url: Option<&str>,
        format: &str,
    ) -> Result<CommandOutput, UpdateError> {
        let current = match current_version {
            Some(raw) => version::parse_version(raw)?,
            None => {
                let path = version_file
                    .map(|p| self.root.join(p))
                    .unwrap_or_else(|| self.config.version_file(&self.root));
                read_version_file(&path)?
            }
        };

        let mut gateway_config = self.config.gateway.clone();
        if let Some(url) = base_url {
            gateway_config.base_url = url.to_string();
        }
        gateway_config.validate().map_err(UpdateError::Config)?;
        let gateway = Arc::new(HttpGateway::new(&gateway_config)?);

        let mut options = self.config.update_options(&self.root);
        if no_snapshot {
            options.snapshot_path = None;
        } else if let Some(path) = snapshot_path {
            options.snapshot_path = Some(path.to_path_buf());
        }

        info!(current = %current, base_url = %gateway_config.base_url, "Starting update check");
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| UpdateError::Config(format!("Failed to start async runtime: {}", e)))?;
        let mut orchestrator = UpdateOrchestrator::new(gateway, options);
        let outcome = runtime.block_on(orchestrator.run(&current))?;

        let exit_code = match &outcome {
            UpdateOutcome::Completed(report) if report.has_failures() => EXIT_PARTIAL,
            _ => 0,
        };
        let text = if format == "json" {
            format_update_json(&outcome)?
        } else {
            let color = self.config.logging.color && std::io::stdout().is_terminal();
            format_update_text(&outcome, color)
        };
        Ok(CommandOutput { text, exit_code })
    }

    fn handle_fingerprint(&self, output: Option<&Path>) -> Result<CommandOutput, UpdateError> {
        let options = self.config.update_options(&self.root);
        let tree = TreeBuilder::new(options.root)
            .with_exclusions(options.exclusions)
            .with_parallel_hashing(options.parallel_hashing)
            .with_follow_symlinks(options.follow_symlinks)
            .build()?;

        match output {
            Some(path) => {
                snapshot::write_snapshot(&tree, path)?;
                Ok(CommandOutput::ok(format!(
                    "Wrote {} file hashes to {}",
                    tree.file_count(),
                    path.display()
                )))
            }
            None => {
                let json = snapshot::to_json_pretty(&tree)?;
                Ok(CommandOutput::ok(json.trim_end().to_string()))
            }
        }
    }

    fn handle_diff(&self, old: &Path, new: &Path, format: &str) -> Result<CommandOutput, UpdateError> {
        let old_tree = snapshot::load_tree(old)?;
        let new_tree = snapshot::load_tree(new)?;
        let changes = diff::diff(&old_tree, &new_tree);
        Ok(CommandOutput::ok(format_change_set(&changes, format)?))
    }

    fn handle_config(&self) -> Result<CommandOutput, UpdateError> {
        let rendered = toml::to_string_pretty(&self.config)
            .map_err(|e| UpdateError::Config(format!("Failed to render configuration: {}", e)))?;
        Ok(CommandOutput::ok(rendered.trim_end().to_string()))
    }
}

/// Read the installed version from a text file (surrounding whitespace ignored)
fn read_version_file(path: &Path) -> Result<semver::Version, UpdateError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        UpdateError::Config(format!(
            "Failed to read version file {}: {}",
            path.display(),
            e
        ))
    })?;
    version::parse_version(content.trim())
}

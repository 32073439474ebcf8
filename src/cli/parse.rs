//! CLI parse: clap types for hashpatch. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hashpatch CLI - find which installation files a new release changes
#[derive(Parser)]
#[command(name = "hashpatch")]
#[command(about = "Fingerprint an installation and resolve downloads for changed files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Installation root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check for a newer release and resolve downloads for changed files
    Update {
        /// Installed version (overrides the version file)
        #[arg(long, short = 'v')]
        current_version: Option<String>,
        /// File holding the installed version
        #[arg(long)]
        version_file: Option<PathBuf>,
        /// Where to write the local tree snapshot
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Do not write a local tree snapshot
        #[arg(long, conflicts_with = "snapshot")]
        no_snapshot: bool,
        /// Override the update service base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Build the local hash tree and print or write it as JSON
    Fingerprint {
        /// Write the tree to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Compare two hash tree JSON files and list what the new one changes
    Diff {
        /// Tree to update from
        old: PathBuf,
        /// Tree to update to
        new: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

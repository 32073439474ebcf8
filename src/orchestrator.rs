//! Update Orchestration
//!
//! Sequences one update run: version check, local fingerprint, remote
//! fingerprint, diff and per-file link resolution. Version and tree steps are
//! fatal on error; link resolution is tolerant per path.

use crate::diff::{self, ChangeSet};
use crate::error::{GatewayError, TreeError, UpdateError};
use crate::gateway::RemoteGateway;
use crate::platform::PlatformTag;
use crate::snapshot;
use crate::tree::builder::TreeBuilder;
use crate::tree::node::HashTree;
use crate::tree::walker::ExclusionSet;
use crate::version;
use futures::stream::{self, StreamExt};
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Steps of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    CheckingVersion,
    BuildingLocalTree,
    FetchingRemoteTree,
    Diffing,
    ResolvingLinks,
    Done,
    NotNewer,
    Failed,
}

impl UpdateState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpdateState::Done | UpdateState::NotNewer | UpdateState::Failed
        )
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateState::CheckingVersion => "checking_version",
            UpdateState::BuildingLocalTree => "building_local_tree",
            UpdateState::FetchingRemoteTree => "fetching_remote_tree",
            UpdateState::Diffing => "diffing",
            UpdateState::ResolvingLinks => "resolving_links",
            UpdateState::Done => "done",
            UpdateState::NotNewer => "not_newer",
            UpdateState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Settings for a single update run
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Installation root to fingerprint
    pub root: PathBuf,
    /// Top-level subtrees left out of the fingerprint
    pub exclusions: ExclusionSet,
    /// Hash files on the rayon pool
    pub parallel_hashing: bool,
    /// Hash symlink targets instead of failing on symlinks
    pub follow_symlinks: bool,
    /// Maximum in-flight download-link requests
    pub link_concurrency: usize,
    /// Where to dump the local tree for inspection, if anywhere
    pub snapshot_path: Option<PathBuf>,
    /// Platform whose release artifacts are compared against
    pub platform: PlatformTag,
}

impl UpdateOptions {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            exclusions: ExclusionSet::default(),
            parallel_hashing: true,
            follow_symlinks: true,
            link_concurrency: 4,
            snapshot_path: None,
            platform: PlatformTag::current(),
        }
    }
}

/// A changed file with a download location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub path: String,
    pub content_hash: String,
    pub url: Url,
}

/// A changed file whose download location could not be resolved
#[derive(Debug)]
pub struct LinkFailure {
    pub path: String,
    pub content_hash: String,
    pub error: GatewayError,
}

/// Result of a completed update run
#[derive(Debug)]
pub struct UpdateReport {
    pub current_version: Version,
    pub target_version: Version,
    pub local_file_count: usize,
    pub remote_file_count: usize,
    pub changes: ChangeSet,
    /// Sorted by path
    pub links: Vec<ResolvedLink>,
    /// Sorted by path
    pub failures: Vec<LinkFailure>,
}

impl UpdateReport {
    pub fn is_up_to_date(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// How an update run ended
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The service has nothing newer than the installed version
    NotNewer { current: Version, latest: Version },
    /// Changes were computed and links resolved (possibly partially)
    Completed(UpdateReport),
}

/// Drives one update run against an injected gateway
pub struct UpdateOrchestrator {
    gateway: Arc<dyn RemoteGateway>,
    options: UpdateOptions,
    transitions: Vec<UpdateState>,
}

impl UpdateOrchestrator {
    pub fn new(gateway: Arc<dyn RemoteGateway>, options: UpdateOptions) -> Self {
        Self {
            gateway,
            options,
            transitions: Vec::new(),
        }
    }

    /// States visited by the last run, in order
    pub fn transitions(&self) -> &[UpdateState] {
        &self.transitions
    }

    /// Current (or final) state of the last run
    pub fn state(&self) -> Option<UpdateState> {
        self.transitions.last().copied()
    }

    fn enter(&mut self, state: UpdateState) {
        debug!(state = %state, "Entering state");
        self.transitions.push(state);
    }

    /// Run the update flow for an installation at `current`
    #[instrument(skip(self, current), fields(root = %self.options.root.display(), current = %current))]
    pub async fn run(&mut self, current: &Version) -> Result<UpdateOutcome, UpdateError> {
        self.transitions.clear();
        let start = Instant::now();

        let result = self.run_steps(current).await;
        match &result {
            Ok(UpdateOutcome::NotNewer { latest, .. }) => {
                self.enter(UpdateState::NotNewer);
                info!(latest = %latest, "Installed version is up to date, skipping update");
            }
            Ok(UpdateOutcome::Completed(report)) => {
                self.enter(UpdateState::Done);
                info!(
                    changed = report.changes.len(),
                    resolved = report.links.len(),
                    failed = report.failures.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Update run completed"
                );
            }
            Err(e) => {
                let failed_in = self.state();
                self.enter(UpdateState::Failed);
                error!(state = ?failed_in, "Update run failed: {}", e);
            }
        }
        result
    }

    async fn run_steps(&mut self, current: &Version) -> Result<UpdateOutcome, UpdateError> {
        self.enter(UpdateState::CheckingVersion);
        let latest = self.gateway.latest_version().await?;
        info!(latest = %latest, "Fetched latest version");
        if !version::is_newer(&latest, current) {
            return Ok(UpdateOutcome::NotNewer {
                current: current.clone(),
                latest,
            });
        }

        self.enter(UpdateState::BuildingLocalTree);
        let local = self.build_local_tree().await?;
        if let Some(path) = &self.options.snapshot_path {
            // Diagnostic only: a failed dump must not block the update
            if let Err(e) = snapshot::write_snapshot(&local, path) {
                warn!("Skipping local tree snapshot: {}", e);
            }
        }

        self.enter(UpdateState::FetchingRemoteTree);
        let remote = self
            .gateway
            .remote_tree(self.options.platform, &latest)
            .await?;
        info!(file_count = remote.file_count(), "Fetched remote tree");

        self.enter(UpdateState::Diffing);
        let changes = diff::diff(&local, &remote);
        info!(changed = changes.len(), "Computed change set");

        self.enter(UpdateState::ResolvingLinks);
        let (links, failures) = self.resolve_links(&changes).await;

        Ok(UpdateOutcome::Completed(UpdateReport {
            current_version: current.clone(),
            target_version: latest,
            local_file_count: local.file_count(),
            remote_file_count: remote.file_count(),
            changes,
            links,
            failures,
        }))
    }

    /// Fingerprint the installation off the async executor
    async fn build_local_tree(&self) -> Result<HashTree, UpdateError> {
        let builder = TreeBuilder::new(self.options.root.clone())
            .with_exclusions(self.options.exclusions.clone())
            .with_parallel_hashing(self.options.parallel_hashing)
            .with_follow_symlinks(self.options.follow_symlinks);

        let tree = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| TreeError::Aborted(e.to_string()))??;
        Ok(tree)
    }

    /// Resolve a download link for every changed path, at most
    /// `link_concurrency` requests in flight
    async fn resolve_links(&self, changes: &ChangeSet) -> (Vec<ResolvedLink>, Vec<LinkFailure>) {
        let concurrency = self.options.link_concurrency.max(1);
        let gateway = &self.gateway;

        let results: Vec<(String, String, Result<Url, GatewayError>)> =
            stream::iter(changes.iter())
                .map(|(path, content_hash)| async move {
                    let result = gateway.resolve_download_link(content_hash).await;
                    (path.to_string(), content_hash.to_string(), result)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        let mut links = Vec::new();
        let mut failures = Vec::new();
        for (path, content_hash, result) in results {
            match result {
                Ok(url) => {
                    debug!(path = %path, url = %url, "Resolved download link");
                    links.push(ResolvedLink {
                        path,
                        content_hash,
                        url,
                    });
                }
                Err(error) => {
                    warn!(path = %path, hash = %content_hash, "Failed to resolve download link: {}", error);
                    failures.push(LinkFailure {
                        path,
                        content_hash,
                        error,
                    });
                }
            }
        }

        links.sort_by(|a, b| a.path.cmp(&b.path));
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        (links, failures)
    }
}

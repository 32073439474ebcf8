//! Remote Update Service Gateway
//!
//! The update service answers three questions: what the latest release is,
//! what the fingerprint of a release looks like on a given platform, and where
//! the bytes for a given content hash can be downloaded. [`RemoteGateway`] is
//! the seam the orchestrator depends on; [`HttpGateway`] talks to the real
//! service over HTTP.

use crate::error::GatewayError;
use crate::platform::PlatformTag;
use crate::tree::hasher;
use crate::tree::node::{HashNode, HashTree};
use crate::version;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use semver::Version;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default update service endpoint
pub const DEFAULT_BASE_URL: &str = "https://update.ravi.cool/";

/// Update service client trait
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Latest published release version
    async fn latest_version(&self) -> Result<Version, GatewayError>;

    /// Published hash tree of `version` for `platform`
    async fn remote_tree(
        &self,
        platform: PlatformTag,
        version: &Version,
    ) -> Result<HashTree, GatewayError>;

    /// Download location for the file with the given content hash
    async fn resolve_download_link(&self, content_hash: &str) -> Result<Url, GatewayError>;
}

/// Gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the update service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Honor HTTP(S)_PROXY / NO_PROXY from the environment
    #[serde(default = "default_system_proxy")]
    pub system_proxy: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_system_proxy() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            system_proxy: default_system_proxy(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid base_url '{}': {}", self.base_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct VersionResponse {
    version: Option<String>,
}

#[derive(Deserialize)]
struct MetadataResponse {
    metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct LinkResponse {
    url: Option<String>,
}

// Helper function to map transport errors to GatewayError
fn map_http_error(url: &Url, error: reqwest::Error) -> GatewayError {
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    GatewayError::Network {
        url: url.to_string(),
        message,
    }
}

fn malformed(url: &Url, message: impl Into<String>) -> GatewayError {
    GatewayError::MalformedResponse {
        url: url.to_string(),
        message: message.into(),
    }
}

/// Check every key is a usable path segment and every leaf is a content hash.
///
/// Keys name where a fetched file lands under the installation root, so empty
/// names, `.`, `..` and names carrying a separator are rejected along with
/// anything that is not a hash.
fn validate_remote_tree(url: &Url, tree: &HashTree) -> Result<(), GatewayError> {
    fn check_segment(url: &Url, path: &str, segment: &str) -> Result<(), GatewayError> {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(['/', '\\'])
        {
            return Err(malformed(
                url,
                format!("entry '{}' has invalid path segment '{}'", path, segment),
            ));
        }
        Ok(())
    }

    fn check(url: &Url, path: &str, node: &HashNode) -> Result<(), GatewayError> {
        match node {
            HashNode::Leaf(hash) if hasher::is_content_hash(hash) => Ok(()),
            HashNode::Leaf(hash) => Err(malformed(
                url,
                format!("entry '{}' has invalid content hash '{}'", path, hash),
            )),
            HashNode::Interior(children) => {
                for (segment, child) in children {
                    let child_path = format!("{}/{}", path, segment);
                    check_segment(url, &child_path, segment)?;
                    check(url, &child_path, child)?;
                }
                Ok(())
            }
        }
    }

    for (segment, node) in tree.root() {
        check_segment(url, segment, segment)?;
        check(url, segment, node)?;
    }
    Ok(())
}

/// HTTP client for the update service
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        // Url::join drops the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Network {
                url: base_url.to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, GatewayError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `url` and decode a JSON body; non-2xx statuses are network errors
    /// except 404, which is handed back for the caller to interpret.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>, GatewayError> {
        debug!(url = %url, "Requesting");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_http_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Network {
                url: url.to_string(),
                message: format!("status {} - {}", status, error_text.trim()),
            });
        }

        let body = response.text().await.map_err(|e| map_http_error(url, e))?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| malformed(url, format!("invalid JSON body: {}", e)))
    }

    fn not_found(url: &Url) -> GatewayError {
        GatewayError::Network {
            url: url.to_string(),
            message: format!("status {}", StatusCode::NOT_FOUND),
        }
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn latest_version(&self) -> Result<Version, GatewayError> {
        let url = self.endpoint("version", &[])?;
        let body: VersionResponse = self
            .get_json(&url)
            .await?
            .ok_or_else(|| Self::not_found(&url))?;

        let raw = body
            .version
            .ok_or_else(|| malformed(&url, "missing 'version' field"))?;
        version::parse_release(&raw)
            .map_err(|e| malformed(&url, format!("unparseable version '{}': {}", raw, e)))
    }

    #[instrument(skip(self, platform, version), fields(platform = %platform, version = %version))]
    async fn remote_tree(
        &self,
        platform: PlatformTag,
        version: &Version,
    ) -> Result<HashTree, GatewayError> {
        if !platform.is_known() {
            return Err(GatewayError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ));
        }

        let version = version.to_string();
        let url = self.endpoint(
            "metadata",
            &[("os", platform.as_str()), ("version", version.as_str())],
        )?;
        let body: MetadataResponse = self
            .get_json(&url)
            .await?
            .ok_or_else(|| Self::not_found(&url))?;

        let metadata = body
            .metadata
            .ok_or_else(|| malformed(&url, "missing 'metadata' field"))?;
        if !metadata.is_object() {
            return Err(malformed(&url, "metadata is not a map"));
        }
        let tree: HashTree = serde_json::from_value(metadata)
            .map_err(|e| malformed(&url, format!("metadata is not a hash tree: {}", e)))?;
        validate_remote_tree(&url, &tree)?;

        debug!(file_count = tree.file_count(), "Fetched remote tree");
        Ok(tree)
    }

    #[instrument(skip(self))]
    async fn resolve_download_link(&self, content_hash: &str) -> Result<Url, GatewayError> {
        let url = self.endpoint("download", &[("hash", content_hash)])?;
        let body: LinkResponse =
            self.get_json(&url)
                .await?
                .ok_or_else(|| GatewayError::NotFound {
                    hash: content_hash.to_string(),
                })?;

        let link = body
            .url
            .filter(|link| !link.is_empty())
            .ok_or_else(|| GatewayError::NotFound {
                hash: content_hash.to_string(),
            })?;
        Url::parse(&link).map_err(|e| malformed(&url, format!("invalid link '{}': {}", link, e)))
    }
}

// Mock gateway for testing
#[cfg(test)]
pub struct MockGateway {
    pub version: Result<Version, String>,
    pub tree: Option<HashTree>,
    pub missing_hashes: Vec<String>,
    pub tree_requests: std::sync::atomic::AtomicUsize,
    pub link_requests: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockGateway {
    pub fn new(version: &str, tree: HashTree) -> Self {
        Self {
            version: Ok(Version::parse(version).unwrap()),
            tree: Some(tree),
            missing_hashes: Vec::new(),
            tree_requests: Default::default(),
            link_requests: Default::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl RemoteGateway for MockGateway {
    async fn latest_version(&self) -> Result<Version, GatewayError> {
        self.version.clone().map_err(|message| GatewayError::Network {
            url: "mock://version".to_string(),
            message,
        })
    }

    async fn remote_tree(
        &self,
        _platform: PlatformTag,
        _version: &Version,
    ) -> Result<HashTree, GatewayError> {
        self.tree_requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.tree
            .clone()
            .ok_or_else(|| GatewayError::MalformedResponse {
                url: "mock://metadata".to_string(),
                message: "metadata is not a map".to_string(),
            })
    }

    async fn resolve_download_link(&self, content_hash: &str) -> Result<Url, GatewayError> {
        self.link_requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.missing_hashes.iter().any(|h| h == content_hash) {
            return Err(GatewayError::NotFound {
                hash: content_hash.to_string(),
            });
        }
        Ok(Url::parse(&format!("https://cdn.example.com/{}", content_hash)).unwrap())
    }
}

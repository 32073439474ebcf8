//! Integration tests for the HTTP update service gateway

use crate::integration::test_utils::{closed_port, TestServer};
use hashpatch::error::GatewayError;
use hashpatch::gateway::{GatewayConfig, HttpGateway, RemoteGateway};
use hashpatch::platform::PlatformTag;
use hashpatch::tree::hasher::compute_content_hash;
use semver::Version;
use serde_json::json;

fn gateway(base_url: String) -> HttpGateway {
    let config = GatewayConfig {
        base_url,
        connect_timeout_secs: 2,
        request_timeout_secs: 5,
        system_proxy: false,
    };
    HttpGateway::new(&config).unwrap()
}

#[tokio::test]
async fn test_latest_version_strips_prefix() {
    let server = TestServer::start(|_| (200, json!({"version": "v1.4.0"}).to_string()));

    let version = gateway(server.base_url()).latest_version().await.unwrap();

    assert_eq!(version, Version::new(1, 4, 0));
    assert_eq!(server.requests(), vec!["/version"]);
}

#[tokio::test]
async fn test_latest_version_pads_short_tags() {
    let server = TestServer::start(|_| (200, json!({"version": "v1.3"}).to_string()));

    let version = gateway(server.base_url()).latest_version().await.unwrap();

    assert_eq!(version, Version::new(1, 3, 0));
}

#[tokio::test]
async fn test_unparseable_version_is_malformed() {
    let server = TestServer::start(|_| (200, json!({"version": "latest"}).to_string()));

    let err = gateway(server.base_url()).latest_version().await.unwrap_err();

    assert!(matches!(err, GatewayError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_server_error_is_network_error() {
    let server = TestServer::start(|_| (500, "{}".to_string()));

    let err = gateway(server.base_url()).latest_version().await.unwrap_err();

    assert!(matches!(err, GatewayError::Network { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let base_url = format!("http://127.0.0.1:{}/", closed_port());

    let err = gateway(base_url).latest_version().await.unwrap_err();

    assert!(matches!(err, GatewayError::Network { .. }));
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let server = TestServer::start(|_| (200, json!({"version": "2.0.0"}).to_string()));
    let base_url = format!("{}api/v1", server.base_url());

    gateway(base_url).latest_version().await.unwrap();

    assert_eq!(server.requests(), vec!["/api/v1/version"]);
}

#[tokio::test]
async fn test_remote_tree_queries_platform_and_version() {
    let hash = compute_content_hash(b"core");
    let body = json!({"metadata": {"app.exe": hash, "lib": {"core.dll": hash}}}).to_string();
    let server = TestServer::start(move |_| (200, body.clone()));

    let tree = gateway(server.base_url())
        .remote_tree(PlatformTag::Ubuntu, &Version::new(1, 2, 3))
        .await
        .unwrap();

    assert_eq!(tree.file_count(), 2);
    assert_eq!(server.requests(), vec!["/metadata?os=ubuntu&version=1.2.3"]);
}

#[tokio::test]
async fn test_remote_tree_rejects_non_hash_leaf() {
    let server = TestServer::start(|_| {
        (200, json!({"metadata": {"app.exe": "not-a-hash"}}).to_string())
    });

    let err = gateway(server.base_url())
        .remote_tree(PlatformTag::Windows, &Version::new(1, 0, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_remote_tree_rejects_traversal_and_separator_keys() {
    let hash = compute_content_hash(b"core");
    let bodies = [
        json!({"metadata": {"..": {"etc": hash}}}),
        json!({"metadata": {"": {"x": hash}}}),
        json!({"metadata": {"a/b": hash, "a": {"b": hash}}}),
    ];
    for body in bodies {
        let body = body.to_string();
        let server = TestServer::start(move |_| (200, body.clone()));

        let err = gateway(server.base_url())
            .remote_tree(PlatformTag::Ubuntu, &Version::new(1, 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
        assert!(err.to_string().contains("invalid path segment"));
    }
}

#[tokio::test]
async fn test_remote_tree_rejects_non_map_metadata() {
    let server = TestServer::start(|_| (200, json!({"metadata": ["a", "b"]}).to_string()));

    let err = gateway(server.base_url())
        .remote_tree(PlatformTag::Macos, &Version::new(1, 0, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_unknown_platform_makes_no_request() {
    let server = TestServer::start(|_| (200, json!({"metadata": {}}).to_string()));

    let err = gateway(server.base_url())
        .remote_tree(PlatformTag::Unknown, &Version::new(1, 0, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::UnsupportedPlatform(_)));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_download_link_resolution() {
    let server = TestServer::start(|target| {
        if target.ends_with("hash=present") {
            (200, json!({"url": "https://cdn.example.com/present"}).to_string())
        } else if target.ends_with("hash=empty") {
            (200, json!({"url": ""}).to_string())
        } else {
            (404, "{}".to_string())
        }
    });
    let gateway = gateway(server.base_url());

    let url = gateway.resolve_download_link("present").await.unwrap();
    assert_eq!(url.as_str(), "https://cdn.example.com/present");

    let missing = gateway.resolve_download_link("missing").await.unwrap_err();
    assert!(missing.is_not_found());

    let empty = gateway.resolve_download_link("empty").await.unwrap_err();
    assert!(empty.is_not_found());
}

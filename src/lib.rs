//! Hashpatch: Content-Addressed Self-Update Client
//!
//! Fingerprints an installation directory as a tree of file content hashes,
//! compares it with the tree the update service publishes for the latest
//! release, and resolves a download location for every file that differs.

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod orchestrator;
pub mod platform;
pub mod snapshot;
pub mod tree;
pub mod types;
pub mod version;

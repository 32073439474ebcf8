//! Core types for the hashpatch update client.

use std::collections::BTreeMap;

/// ContentHash: lowercase hex MD5 digest of a file's bytes
pub type ContentHash = String;

/// FlatPathMap: `/`-joined relative path to content hash
pub type FlatPathMap = BTreeMap<String, ContentHash>;

/// Length of a hex-rendered MD5 digest
pub const CONTENT_HASH_HEX_LEN: usize = 32;

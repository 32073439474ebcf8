//! Host platform detection for selecting release artifacts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of the host operating system on the update service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformTag {
    Windows,
    Ubuntu,
    Macos,
    Unknown,
}

impl PlatformTag {
    /// Platform of the running binary
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a Rust target OS name to the service's tag
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => PlatformTag::Windows,
            "linux" => PlatformTag::Ubuntu,
            "macos" => PlatformTag::Macos,
            _ => PlatformTag::Unknown,
        }
    }

    /// Tag as sent to the update service; empty for unknown platforms
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformTag::Windows => "windows",
            PlatformTag::Ubuntu => "ubuntu",
            PlatformTag::Macos => "macos",
            PlatformTag::Unknown => "",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PlatformTag::Unknown)
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformTag::Unknown => write!(f, "unknown"),
            known => f.write_str(known.as_str()),
        }
    }
}

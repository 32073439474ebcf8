//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{GatewayError, UpdateError};

/// Map update errors to a single line for CLI output.
pub fn map_error(e: &UpdateError) -> String {
    match e {
        UpdateError::Gateway(GatewayError::Network { .. }) => {
            format!("Update service unreachable: {}", e)
        }
        UpdateError::Gateway(GatewayError::UnsupportedPlatform(_)) => {
            format!("{} (updates are published for windows, ubuntu and macos)", e)
        }
        _ => e.to_string(),
    }
}

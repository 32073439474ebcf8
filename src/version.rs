//! Release version parsing and comparison

use crate::error::UpdateError;
use semver::Version;

/// Parse a release version string
///
/// Surrounding whitespace and a leading `v` are tolerated, since version files
/// and release tags commonly carry both.
pub fn parse_version(input: &str) -> Result<Version, UpdateError> {
    parse_release(input).map_err(|e| UpdateError::VersionParse {
        input: input.to_string(),
        message: e.to_string(),
    })
}

/// Parse a release tag as published: `v` prefix optional, and missing minor
/// or patch components read as `0` (`1.2` is `1.2.0`, `v1` is `1.0.0`).
pub fn parse_release(input: &str) -> Result<Version, semver::Error> {
    let trimmed = input.trim();
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let split = bare.find(['-', '+']).unwrap_or(bare.len());
    let (core, suffix) = bare.split_at(split);
    let padding = match core.split('.').count() {
        1 if !core.is_empty() => ".0.0",
        2 => ".0",
        _ => "",
    };
    Version::parse(&format!("{}{}{}", core, padding, suffix))
}

/// Whether `remote` is strictly newer than `current` under semver precedence
pub fn is_newer(remote: &Version, current: &Version) -> bool {
    remote > current
}

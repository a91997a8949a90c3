//! Release Check
//!
//! Asks GitHub for the latest published release once at startup and
//! compares it against the build version. Failures here must never get in
//! the user's way: callers log the error at debug level and move on.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/menacelabs/certsmith/releases/latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    tag_name: String,
    html_url: String,
}

/// Returns the release page URL when a newer version is published.
pub fn check_for_newer_release() -> Result<Option<String>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("certsmith/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build the release check client")?;

    let release: ReleaseInfo = client
        .get(LATEST_RELEASE_URL)
        .send()
        .context("release check request failed")?
        .error_for_status()
        .context("release check was rejected")?
        .json()
        .context("release check returned malformed JSON")?;

    debug!(tag = %release.tag_name, "latest published release");
    if is_newer(&release.tag_name, env!("CARGO_PKG_VERSION")) {
        Ok(Some(release.html_url))
    } else {
        Ok(None)
    }
}

/// Dotted numeric comparison with an optional `v` prefix. Anything that
/// does not parse is treated as not newer, so a malformed tag can never
/// nag the user.
fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

fn parse_version(value: &str) -> Option<[u64; 3]> {
    let trimmed = value.trim().trim_start_matches('v');
    let mut parts = [0u64; 3];
    for (index, piece) in trimmed.split('.').enumerate() {
        if index >= 3 {
            break;
        }
        parts[index] = piece.parse().ok()?;
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_versions() {
        assert!(is_newer("0.4.0", "0.3.1"));
        assert!(is_newer("v1.0.0", "0.9.9"));
        assert!(is_newer("0.3.2", "0.3.1"));
    }

    #[test]
    fn test_not_newer() {
        assert!(!is_newer("0.3.1", "0.3.1"));
        assert!(!is_newer("0.3.0", "0.3.1"));
        assert!(!is_newer("v0.2.9", "0.3.1"));
    }

    #[test]
    fn test_short_versions_pad_with_zero() {
        assert!(is_newer("1", "0.9.0"));
        assert!(!is_newer("1", "1.0.0"));
    }

    #[test]
    fn test_garbage_is_never_newer() {
        assert!(!is_newer("nightly", "0.3.1"));
        assert!(!is_newer("", "0.3.1"));
        assert!(!is_newer("1.2.3", "garbage"));
    }
}

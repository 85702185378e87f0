//! Source-control metadata attached to a report.
//!
//! CI tooling tells the gate which commit a report belongs to either through
//! query parameters or through headers. Every field is resolved in the same
//! order, first non-empty value wins:
//!
//! 1. query parameter `<name>`
//! 2. header `swingletree-<name>`
//! 3. header `x-swingletree-<name>` (deprecated prefix, kept for older clients)
//!
//! | Field     | Query / header name |
//! |-----------|---------------------|
//! | remote    | `remote`            |
//! | owner     | `org`               |
//! | repo      | `repo`              |
//! | sha       | `sha`               |
//! | build id  | `uid`               |
//! | branch    | `branch`            |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prefix of metadata headers
pub const HEADER_PREFIX: &str = "swingletree-";

/// Deprecated prefix of metadata headers
pub const LEGACY_HEADER_PREFIX: &str = "x-swingletree-";

const REMOTE: &str = "remote";
const OWNER: &str = "org";
const REPO: &str = "repo";
const SHA: &str = "sha";
const BUILD_ID: &str = "uid";
const BRANCH: &str = "branch";

/// Coordinates of the commit a report was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    pub owner: String,

    pub repo: String,

    pub sha: String,

    /// Branch names in the order they were given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Vec<String>>,
}

/// Metadata forwarded to plugins alongside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMetadata {
    pub source: ScmSource,

    #[serde(
        rename = "buildId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub build_id: Option<String>,
}

impl WebhookMetadata {
    /// Extract metadata from query parameters and headers.
    ///
    /// Header names are matched case-insensitively. Returns `None` unless
    /// owner, repository and commit sha are all present; reports without
    /// complete metadata are still relayed.
    ///
    /// The branch value is split on `,` without trimming.
    pub fn extract(
        query: &HashMap<String, String>,
        headers: &HashMap<String, String>,
    ) -> Option<Self> {
        let lookup = |name: &str| find_property(query, headers, name).map(str::to_string);

        let owner = lookup(OWNER)?;
        let repo = lookup(REPO)?;
        let sha = lookup(SHA)?;

        let branch = lookup(BRANCH).map(|value| value.split(',').map(str::to_string).collect());

        Some(Self {
            source: ScmSource {
                remote: lookup(REMOTE),
                owner,
                repo,
                sha,
                branch,
            },
            build_id: lookup(BUILD_ID),
        })
    }
}

/// Resolve a single property following the query, header, legacy header order.
pub fn find_property<'a>(
    query: &'a HashMap<String, String>,
    headers: &'a HashMap<String, String>,
    name: &str,
) -> Option<&'a str> {
    non_empty(query.get(name).map(String::as_str))
        .or_else(|| header_value(headers, &format!("{HEADER_PREFIX}{name}")))
        .or_else(|| header_value(headers, &format!("{LEGACY_HEADER_PREFIX}{name}")))
}

fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    let value = headers
        .get(name)
        .or_else(|| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
        .map(String::as_str);
    non_empty(value)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;

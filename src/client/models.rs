use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A release, as returned by the list-releases endpoint.
///
/// See <https://docs.github.com/en/rest/releases/releases?apiVersion=2022-11-28#list-releases>
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GithubRelease {
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

impl GithubRelease {
    /// The release name, falling back to the tag name for unnamed releases.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.tag_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GithubAsset {
    pub name: String,
    pub download_count: u64,
}

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, trace};

use crate::client::models::GithubRelease;

/// Checksum sidecars and version marker files aren't real downloads.
static IGNORE_ASSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.sha256|\.sha512|VERSION").expect("ignore pattern is valid"));

const MILLISECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// A release, annotated with download statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub name: String,
    pub draft: bool,
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
    /// When the next stable release replaced this one, or the time of aggregation.
    pub active_until: DateTime<Utc>,
    pub days_active: f64,
    pub downloads_total: u64,
    pub downloads_per_day: f64,
    pub downloads: BTreeMap<String, u64>,
    /// `None` when nothing was downloaded.
    pub download_ratios: Option<BTreeMap<String, f64>>,
}

impl Release {
    /// Drafts and prereleases are left out of the time-series charts.
    pub fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease
    }
}

pub fn is_ignored_asset(name: &str) -> bool {
    IGNORE_ASSET_RE.is_match(name)
}

/// Annotate releases, ordered newest first, with their active window and download rates.
///
/// Each release is considered active until the nearest newer stable release was
/// published. Walking newest to oldest, that boundary is carried along as a horizon,
/// which starts out at `now` and only ever moves back in time.
///
/// A release published after the horizon (listed below a newer stable release, but
/// published later) is active until its own publish time, so it has no active window.
pub fn aggregate_releases(releases: &[GithubRelease], now: DateTime<Utc>) -> Vec<Release> {
    let mut horizon = now;

    let mut result: Vec<Release> = releases
        .iter()
        .map(|r| {
            let downloads: BTreeMap<String, u64> = r
                .assets
                .iter()
                .filter(|a| {
                    let ignored = is_ignored_asset(&a.name);
                    if ignored {
                        trace!(release = r.tag_name, "Ignoring asset {}", a.name);
                    }
                    !ignored
                })
                .map(|a| (a.name.clone(), a.download_count))
                .collect();

            let release = Release {
                name: r.display_name().to_string(),
                draft: r.draft,
                prerelease: r.prerelease,
                published_at: r.published_at,
                active_until: r.published_at.map_or(horizon, |p| horizon.max(p)),
                days_active: 0.0,
                downloads_total: downloads.values().sum(),
                downloads_per_day: 0.0,
                downloads,
                download_ratios: None,
            };

            if let (true, Some(published_at)) = (release.is_stable(), release.published_at) {
                horizon = horizon.min(published_at);
            }

            release
        })
        .collect();

    for release in &mut result {
        release.days_active = release
            .published_at
            .map_or(0.0, |p| (release.active_until - p).num_milliseconds() as f64 / MILLISECONDS_PER_DAY);

        // A release published right at the horizon has no active window to spread its
        // downloads over, so its rate is its total.
        release.downloads_per_day = if release.days_active > 0.0 {
            release.downloads_total as f64 / release.days_active
        } else {
            release.downloads_total as f64
        };

        if release.downloads_total > 0 {
            let total = release.downloads_total as f64;
            release.download_ratios = Some(
                release
                    .downloads
                    .iter()
                    .map(|(name, count)| (name.clone(), *count as f64 / total))
                    .collect(),
            );
        }

        debug!(
            release = release.name,
            days_active = release.days_active,
            downloads_total = release.downloads_total,
            download_ratios = ?release.download_ratios,
            "Aggregated release"
        );
    }

    result
}

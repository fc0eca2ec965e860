use std::path::{Path, PathBuf};

use clap::Parser;
use humantime::Duration;
use tracing::Level;
use url::Url;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Input {
    /// The repository to report on, as a URL or an `organization/project` path
    #[arg(long)]
    pub repo: String,

    /// Path to a file containing the GitHub token to authenticate with
    #[arg(long)]
    pub token_path: PathBuf,

    /// The GitHub API base url. Set this when targeting GitHub Enterprise
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub api_url: Url,

    /// How long fetching every page of releases may take before giving up
    #[arg(long, default_value = "5m")]
    pub timeout: Duration,

    /// The log level to use for the tracing subscriber
    #[arg(long, global = true, default_value = "info")]
    pub log_level: Level,
}

/// Reconstruct the command the tool was invoked with, for display in the report.
///
/// The program path is reduced to its file name, so the report doesn't leak
/// the layout of the machine it was generated on.
pub fn invocation_command<I>(args: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let program = args
        .next()
        .map(|p| {
            Path::new(&p)
                .file_name()
                .map_or_else(|| p.clone(), |n| n.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    std::iter::once(program).chain(args).collect::<Vec<_>>().join(" ")
}

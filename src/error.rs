use std::path::PathBuf;

use thiserror::Error;

/// Every way a report run can fail. All of them are fatal.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read token from {path}: {source}")]
    CredentialRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {0} is empty")]
    EmptyCredential(PathBuf),

    #[error("failed to fetch releases: {0}")]
    Fetch(color_eyre::Report),

    #[error("invalid repository identifier {value:?}: {reason}")]
    InvalidRepositoryIdentifier { value: String, reason: &'static str },

    #[error("no releases found for {0}")]
    EmptyReleaseList(String),

    #[error("failed to render report: {0}")]
    Render(#[from] askama::Error),
}

impl ReportError {
    /// The pipeline stage an error originated from, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::CredentialRead { .. } | Self::EmptyCredential(_) => "token",
            Self::InvalidRepositoryIdentifier { .. } => "input",
            Self::Fetch(_) => "fetch",
            Self::EmptyReleaseList(_) | Self::Render(_) => "render",
        }
    }
}

use std::fmt;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::ReportError;

/// The access token used to authenticate towards the GitHub API.
///
/// The token is sent as a bearer credential. Any token type GitHub accepts
/// (classic or fine-grained personal access tokens, `$GITHUB_TOKEN`, oauth tokens)
/// works, since we only read public release data.
#[derive(Debug, Clone)]
pub struct Token(SecretString);

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Token {
    pub fn new(value: &str) -> Self {
        Self(SecretString::from(value.to_string()))
    }

    /// Read a token from a file, trimming surrounding whitespace and newlines.
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let contents = fs::read_to_string(path).map_err(|source| ReportError::CredentialRead {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Err(ReportError::EmptyCredential(path.to_path_buf()));
        }
        debug!("Read token from {}", path.display());
        Ok(Self::new(trimmed))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// An organization (or user) and project pair, identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub organization: String,
    pub project: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.project)
    }
}

impl Repository {
    /// Parse a repository from either a URL like `https://github.com/acme/widget`
    /// or a bare `acme/widget` path.
    pub fn try_from_str(value: &str) -> Result<Self, ReportError> {
        let value = value.trim();

        let segments: Vec<String> = match Url::parse(value) {
            Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => url
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).map(String::from).collect())
                .unwrap_or_default(),
            _ => value.split('/').filter(|s| !s.is_empty()).map(String::from).collect(),
        };

        match segments.as_slice() {
            [organization, project, ..] => {
                let project = project.strip_suffix(".git").unwrap_or(project.as_str());
                if project.is_empty() {
                    return Err(ReportError::InvalidRepositoryIdentifier {
                        value: value.to_string(),
                        reason: "the project name is empty",
                    });
                }
                Ok(Self {
                    organization: organization.to_string(),
                    project: project.to_string(),
                })
            }
            _ => Err(ReportError::InvalidRepositoryIdentifier {
                value: value.to_string(),
                reason: "expected a repository URL or an `organization/project` path",
            }),
        }
    }
}

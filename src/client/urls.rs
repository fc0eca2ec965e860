use color_eyre::Result;
use url::Url;

use crate::cli::models::Repository;

#[derive(Debug)]
pub struct Urls {
    pub list_releases_url: Url,
}

impl Urls {
    pub fn new(github_api_url: &Url, repository: &Repository) -> Result<Self> {
        // Make sure joins append to the base path, so GHES urls like
        // https://ghes.example/api/v3 keep their prefix.
        let mut api_base = github_api_url.clone();
        if !api_base.path().ends_with('/') {
            api_base.set_path(&format!("{}/", api_base.path()));
        }

        let list_releases_url = api_base.join(&format!(
            "repos/{}/{}/releases?per_page=100",
            Self::percent_encode(&repository.organization),
            Self::percent_encode(&repository.project),
        ))?;

        Ok(Self { list_releases_url })
    }

    /// Percent-encodes a string, as is necessary for path segments built from user input.
    pub fn percent_encode(n: &str) -> String {
        urlencoding::encode(n).to_string()
    }
}

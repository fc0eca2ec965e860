use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use tower::limit::RateLimit;
use tower::ServiceBuilder;
use tracing::debug;
use url::Url;

use crate::cli::models::{Repository, Token};
use crate::client::client::ReleasesClient;
use crate::client::urls::Urls;

pub type RateLimitedService = RateLimit<Client>;

#[derive(Debug, Default)]
pub struct ReleasesClientBuilder {
    pub headers: Option<HeaderMap>,
    pub urls: Option<Urls>,
    pub list_releases_service: Option<RateLimitedService>,
}

impl ReleasesClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add default HTTP headers for the client to use in all requests.
    pub fn set_http_headers(mut self, token: &Token) -> Result<Self> {
        debug!("Constructing HTTP headers");
        let auth_header_value = format!("Bearer {}", token.expose());
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", auth_header_value.as_str().parse()?);
        headers.insert("X-GitHub-Api-Version", "2022-11-28".parse()?);
        headers.insert("Accept", "application/vnd.github+json".parse()?);
        headers.insert(
            "User-Agent",
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).parse()?,
        );
        self.headers = Some(headers);
        Ok(self)
    }

    /// Attach a urls utility struct.
    pub fn generate_urls(mut self, github_api_url: &Url, repository: &Repository) -> Result<Self> {
        debug!("Constructing base urls");
        self.urls = Some(Urls::new(github_api_url, repository)?);
        Ok(self)
    }

    /// Creates a service which respects the secondary rate limit for reads
    /// enforced by the GitHub API.
    ///
    /// There should be no more than 900 points per endpoint, per minute, for REST
    /// endpoints. Reads are counted as 1 point. Read more here:
    /// <https://docs.github.com/en/rest/using-the-rest-api/rate-limits-for-the-rest-api?apiVersion=2022-11-28#about-secondary-rate-limits>
    ///
    /// Requests are sent one at a time, so there is no need to bound concurrency.
    pub fn create_rate_limited_service(mut self) -> Self {
        const MAX_POINTS_PER_ENDPOINT_PER_MINUTE: u64 = 900;
        const GET_REQUEST_POINTS: u64 = 1;
        const ONE_MINUTE: Duration = Duration::from_secs(60);

        debug!("Creating rate-limited service");

        self.list_releases_service = Some(
            ServiceBuilder::new()
                .rate_limit(MAX_POINTS_PER_ENDPOINT_PER_MINUTE / GET_REQUEST_POINTS, ONE_MINUTE)
                .service(Client::new()),
        );

        self
    }

    pub fn build(self) -> Result<ReleasesClient> {
        match (self.headers, self.urls, self.list_releases_service) {
            (Some(headers), Some(urls), Some(list_releases_service)) => Ok(ReleasesClient {
                headers,
                urls,
                list_releases_service,
            }),
            _ => Err(eyre!("All required fields are not set")),
        }
    }
}

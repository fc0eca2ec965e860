use color_eyre::eyre::{eyre, Result};
use reqwest::header::HeaderMap;
use reqwest::{Method, Request};
use tower::{Service, ServiceExt};
use tracing::{debug, info, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use url::Url;

use crate::client::builder::RateLimitedService;
use crate::client::headers::GithubHeaders;
use crate::client::models::GithubRelease;
use crate::client::urls::Urls;

#[derive(Debug)]
pub struct ReleasesClient {
    pub headers: HeaderMap,
    pub urls: Urls,
    pub list_releases_service: RateLimitedService,
}

impl ReleasesClient {
    /// List every release of the repository, newest first.
    ///
    /// Follows the `Link` header until there are no more pages. The first failing
    /// page fails the whole listing, so callers never see a partial result.
    pub async fn list_releases(&mut self) -> Result<Vec<GithubRelease>> {
        let url = self.urls.list_releases_url.clone();
        let releases = self.fetch_releases_with_pagination(url).await?;
        info!("Found {} release(s)", releases.len());
        Ok(releases)
    }

    async fn fetch_releases_with_pagination(&mut self, url: Url) -> Result<Vec<GithubRelease>> {
        let mut result = Vec::new();
        let mut next_url = Some(url);

        while let Some(current_url) = next_url {
            debug!("Fetching data from {}", current_url);

            let mut request = Request::new(Method::GET, current_url.clone());
            *request.headers_mut() = self.headers.clone();

            // Wait for a green light from the service. This can wait upwards of a minute
            // if we've just exceeded the per-minute max requests
            let service = match self.list_releases_service.ready().await {
                Ok(t) => t,
                Err(e) => return Err(eyre!("Service failed to become ready: {}", e)),
            };
            let response = match service.call(request).await {
                Ok(t) => t,
                Err(e) => return Err(eyre!("Request to {current_url} failed: {}", e)),
            };

            let status = response.status();
            let response_headers = GithubHeaders::from_header_map(response.headers());

            // Get the string value of the response first, so we can return it in
            // a possible error. This will happen if the token is rejected, the
            // repository doesn't exist, or one of our response structs is misconfigured
            let raw_json = response.text().await?;

            if !status.is_success() {
                return Err(eyre!("Received {status} from {current_url}: {raw_json}"));
            }

            let mut items: Vec<GithubRelease> = match serde_json::from_str(&raw_json) {
                Ok(t) => t,
                Err(e) => {
                    return Err(eyre!(
                        "Failed to deserialize paginated response: {raw_json}. The error was {e}."
                    ));
                }
            };

            result.append(&mut items);

            if let Some(remaining) = response_headers.x_ratelimit_remaining {
                debug!(
                    reset = ?response_headers.x_ratelimit_reset,
                    "There are {remaining} requests remaining in the rate limit"
                );
            }

            Span::current().pb_set_message(&format!("fetched \x1b[33m{}\x1b[0m releases", result.len()));

            next_url = response_headers.next_link();
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::models::{Repository, Token};
    use crate::client::builder::ReleasesClientBuilder;

    fn client_for(server: &mockito::ServerGuard) -> ReleasesClient {
        ReleasesClientBuilder::new()
            .set_http_headers(&Token::new("test-token"))
            .unwrap()
            .generate_urls(
                &Url::parse(&server.url()).unwrap(),
                &Repository {
                    organization: "acme".to_string(),
                    project: "widget".to_string(),
                },
            )
            .unwrap()
            .create_rate_limited_service()
            .build()
            .unwrap()
    }

    fn release_json(tag: &str, published_at: &str) -> String {
        format!(
            r#"{{"tag_name": "{tag}", "name": null, "draft": false, "prerelease": false, "published_at": "{published_at}", "assets": [{{"name": "widget.tar.gz", "download_count": 5}}]}}"#
        )
    }

    #[tokio::test]
    async fn follows_pagination() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/repos/acme/widget/releases?per_page=100&page=2", server.url());

        let first_page = server
            .mock("GET", "/repos/acme/widget/releases")
            .match_query(mockito::Matcher::Exact("per_page=100".into()))
            .match_header("authorization", "Bearer test-token")
            .with_header("content-type", "application/json")
            .with_header("link", &format!("<{next}>; rel=\"next\", <{next}>; rel=\"last\""))
            .with_header("x-ratelimit-remaining", "4999")
            .with_body(format!(
                "[{}, {}]",
                release_json("v3", "2024-03-01T00:00:00Z"),
                release_json("v2", "2024-02-01T00:00:00Z")
            ))
            .create_async()
            .await;
        let second_page = server
            .mock("GET", "/repos/acme/widget/releases")
            .match_query(mockito::Matcher::Exact("per_page=100&page=2".into()))
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", release_json("v1", "2024-01-01T00:00:00Z")))
            .create_async()
            .await;

        let mut client = client_for(&server);
        let releases = client.list_releases().await.unwrap();

        assert_eq!(
            releases.iter().map(|r| r.tag_name.as_str()).collect::<Vec<_>>(),
            vec!["v3", "v2", "v1"]
        );
        second_page.assert_async().await;
        first_page.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_fails_the_listing() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/widget/releases")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let error = client.list_releases().await.unwrap_err().to_string();
        assert!(error.contains("401"), "error was {error}");
        assert!(error.contains("Bad credentials"), "error was {error}");
    }

    #[tokio::test]
    async fn failing_second_page_returns_no_partial_result() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/repos/acme/widget/releases?per_page=100&page=2", server.url());

        let _first = server
            .mock("GET", "/repos/acme/widget/releases")
            .match_query(mockito::Matcher::Exact("per_page=100".into()))
            .with_header("link", &format!("<{next}>; rel=\"next\""))
            .with_body(format!("[{}]", release_json("v2", "2024-02-01T00:00:00Z")))
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/repos/acme/widget/releases")
            .match_query(mockito::Matcher::Exact("per_page=100&page=2".into()))
            .with_status(403)
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let mut client = client_for(&server);
        assert!(client.list_releases().await.is_err());
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/widget/releases")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"unexpected": "object"}"#)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let error = client.list_releases().await.unwrap_err().to_string();
        assert!(error.contains("Failed to deserialize paginated response"), "error was {error}");
    }
}

use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

/// The subset of GitHub response headers we care about.
#[derive(Debug)]
pub struct GithubHeaders {
    pub x_ratelimit_remaining: Option<usize>,
    pub x_ratelimit_reset: Option<DateTime<Utc>>,
    pub link: Option<String>,
}

impl GithubHeaders {
    /// Collect known headers. Values that fail to parse are logged and skipped,
    /// since none of them are required to make progress.
    pub fn from_header_map(value: &HeaderMap) -> Self {
        let mut x_ratelimit_remaining = None;
        let mut x_ratelimit_reset = None;
        let mut link = None;

        for (k, v) in value {
            let Ok(v) = v.to_str() else {
                debug!("Skipping non-ascii value for header {k}");
                continue;
            };
            match k.as_str() {
                "x-ratelimit-remaining" => x_ratelimit_remaining = usize::from_str(v).ok(),
                "x-ratelimit-reset" => {
                    x_ratelimit_reset = i64::from_str(v).ok().and_then(|t| DateTime::from_timestamp(t, 0));
                }
                "link" => link = Some(v.to_string()),
                _ => (),
            }
        }

        Self {
            x_ratelimit_remaining,
            x_ratelimit_reset,
            link,
        }
    }

    /// Find the `rel="next"` url in a `Link` header.
    ///
    /// See <https://docs.github.com/en/rest/using-the-rest-api/using-pagination-in-the-rest-api>
    pub fn parse_link_header(link_header: &str) -> Option<Url> {
        for part in link_header.split(',') {
            let mut sections = part.trim().split(';');
            let target = sections.next()?.trim();

            let is_next = sections.any(|param| {
                let param = param.trim();
                param == "rel=\"next\"" || param == "rel=next"
            });
            if !is_next {
                debug!("Skipping parsing of link: {part}");
                continue;
            }

            debug!("Parsing next link: {part}");
            let url = target.strip_prefix('<')?.strip_suffix('>')?;
            return Url::parse(url).ok();
        }
        None
    }

    pub fn next_link(&self) -> Option<Url> {
        self.link.as_deref().and_then(Self::parse_link_header)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn github_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", "60".parse().unwrap());
        headers.insert("x-ratelimit-remaining", "60".parse().unwrap());
        headers.insert("x-ratelimit-reset", "1714483761".parse().unwrap());
        headers.insert("x-ratelimit-used", "0".parse().unwrap());

        let parsed_headers = GithubHeaders::from_header_map(&headers);

        assert_eq!(parsed_headers.x_ratelimit_reset.unwrap().timestamp(), 1714483761);
        assert_eq!(parsed_headers.x_ratelimit_remaining, Some(60));
        assert!(parsed_headers.link.is_none());
        assert!(parsed_headers.next_link().is_none());
    }

    #[test]
    fn malformed_github_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", "lots".parse().unwrap());
        headers.insert("x-ratelimit-reset", "tomorrow".parse().unwrap());

        let parsed_headers = GithubHeaders::from_header_map(&headers);
        assert!(parsed_headers.x_ratelimit_remaining.is_none());
        assert!(parsed_headers.x_ratelimit_reset.is_none());
    }

    #[traced_test]
    #[test]
    fn link_header() {
        let link_headers = [
            (
                "<https://api.github.com/repositories/1/releases?per_page=100&page=2>; rel=\"next\", <https://api.github.com/repositories/1/releases?per_page=100&page=7>; rel=\"last\"",
                Some(Url::parse("https://api.github.com/repositories/1/releases?per_page=100&page=2").unwrap())
            ),
            (
                "<https://api.github.com/repositories/1/releases?per_page=100&page=1>; rel=\"prev\", <https://api.github.com/repositories/1/releases?per_page=100&page=3>; rel=\"next\", <https://api.github.com/repositories/1/releases?per_page=100&page=1>; rel=\"first\"",
                Some(Url::parse("https://api.github.com/repositories/1/releases?per_page=100&page=3").unwrap())
            ),
            (
                "<https://api.github.com/repositories/1/releases?per_page=100&page=1>; rel=\"prev\", <https://api.github.com/repositories/1/releases?per_page=100&page=1>; rel=\"first\"",
                None
            ),
            (
                "<<https://api.github.com/repositories/1/releases?per_page=100&page=2>; rel=\"last\"",
                None
            ),
            ("", None),
        ];

        for (input, expected) in link_headers {
            let parsed_links = GithubHeaders::parse_link_header(input);
            assert_eq!(parsed_links, expected)
        }
        assert!(logs_contain("Parsing next link"));
        assert!(logs_contain("Skipping parsing of link"));
    }
}

use std::env;
use std::io::{self, Write};
use std::process::exit;

use chrono::Utc;
use clap::Parser;
use color_eyre::eyre::eyre;
use indicatif::ProgressStyle;
use tracing::{debug, error, info, info_span, Instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::args::{invocation_command, Input};
use crate::cli::models::{Repository, Token};
use crate::client::builder::ReleasesClientBuilder;
use crate::client::models::GithubRelease;
use crate::error::ReportError;
use crate::report::aggregate::aggregate_releases;
use crate::report::render::render_report;

pub mod cli;
pub mod client;
pub mod error;
pub mod report;

/// Fetch every release of the repository, giving up once `input.timeout` has passed.
async fn fetch_releases(input: &Input, repository: &Repository, token: &Token) -> Result<Vec<GithubRelease>, ReportError> {
    let mut client = ReleasesClientBuilder::new()
        .set_http_headers(token)
        .and_then(|builder| builder.generate_urls(&input.api_url, repository))
        .map_err(ReportError::Fetch)?
        .create_rate_limited_service()
        .build()
        .map_err(ReportError::Fetch)?;

    let span = info_span!("fetch releases", repository = %repository);
    if let Ok(style) =
        ProgressStyle::default_spinner().template(&format!("{{spinner}} \x1b[34m{repository}\x1b[0m: {{msg}}"))
    {
        span.pb_set_style(&style);
    }
    span.pb_set_message("fetched \x1b[33m0\x1b[0m releases");

    match tokio::time::timeout(*input.timeout, client.list_releases().instrument(span)).await {
        Ok(releases) => releases.map_err(ReportError::Fetch),
        Err(_) => Err(ReportError::Fetch(eyre!(
            "Gave up fetching releases after {}",
            input.timeout
        ))),
    }
}

/// Produce the HTML report: parse the repository, fetch, aggregate and render.
async fn run(input: &Input) -> Result<String, ReportError> {
    let repository = Repository::try_from_str(&input.repo)?;
    let token = Token::from_file(&input.token_path)?;

    info!("Downloading releases for {repository}");
    let releases = fetch_releases(input, &repository, &token).await?;

    let releases = aggregate_releases(&releases, Utc::now());

    debug!("Rendering report for {} release(s)", releases.len());
    render_report(&input.repo, &invocation_command(env::args()), &releases)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Missing or malformed arguments print usage and exit with status 2
    let input = Input::parse();

    // Set up logging. Standard output is reserved for the report
    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(input.log_level).into())
                .from_env_lossy(),
        )
        .with(indicatif_layer)
        .init();
    debug!("Logging initialized");

    let html = match run(&input).await {
        Ok(t) => t,
        Err(e) => {
            error!(stage = e.stage(), "{e}");
            exit(1);
        }
    };

    if let Err(e) = io::stdout().lock().write_all(html.as_bytes()) {
        error!(stage = "output", "Failed to write report: {e}");
        exit(1);
    }
}

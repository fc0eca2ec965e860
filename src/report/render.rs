use askama::Template;
use serde_json::{json, Value};

use crate::error::ReportError;
use crate::report::aggregate::Release;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    /// The repository, as the user passed it
    repo: &'a str,
    /// The command the report was generated with
    command: &'a str,
    release_frequency_rows: String,
    asset_mix_rows: String,
    downloads_per_day_rows: String,
    downloads_over_time_rows: String,
}

/// Join chart rows into the body of a javascript array literal.
///
/// The rows end up inside `<script>` tags, so `</` is escaped to keep
/// release and asset names from closing the tag.
fn chart_rows(rows: impl Iterator<Item = Value>) -> String {
    rows.map(|row| row.to_string().replace("</", "<\\/"))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Render the HTML report for a list of aggregated releases, ordered newest first.
///
/// The first release is treated as the latest one, and its asset mix is charted
/// separately. An empty list is an error, since there is nothing to chart.
pub fn render_report(repo: &str, command: &str, releases: &[Release]) -> Result<String, ReportError> {
    let latest = releases
        .first()
        .ok_or_else(|| ReportError::EmptyReleaseList(repo.to_string()))?;

    let stable = || releases.iter().filter(|r| r.is_stable());

    let template = ReportTemplate {
        repo,
        command,
        release_frequency_rows: chart_rows(
            stable().map(|r| json!([r.name, r.days_active, format!("{:.0}", r.days_active)])),
        ),
        asset_mix_rows: chart_rows(
            latest
                .downloads
                .iter()
                .map(|(name, count)| json!([name, count, format!("{name} ({count})")])),
        ),
        downloads_per_day_rows: chart_rows(
            stable().map(|r| json!([r.name, r.downloads_per_day, r.downloads_total.to_string()])),
        ),
        downloads_over_time_rows: chart_rows(
            stable().map(|r| json!([r.active_until.format(DATE_FORMAT).to_string(), r.downloads_per_day])),
        ),
    };

    Ok(template.render()?)
}

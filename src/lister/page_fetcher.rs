use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{FilingPage, FilingRecord};
use reqwest::StatusCode;
use tracing::{debug, error, info};

use super::extract::{extract_filing_data, sort_filings};

/// Lists every filing the API holds for a country, as one table sorted by
/// `(period_end, processed)`.
///
/// Follows `links.next` page by page until a page reports itself as the last one.
///
/// # Returns
///
/// - `Ok(Some(rows))` once every page was fetched.
/// - `Ok(None)` when the first request answers with a non-200 status. The status is
///   logged and nothing is concatenated.
///
/// # Errors
///
/// Only the first request is status-checked. A later page that fails comes back as a
/// body that is not a filings page, which surfaces as a `ParseError`. Transport errors
/// surface as `NetworkError`.
pub async fn list_filings(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    country: &str,
) -> AppResult<Option<Vec<FilingRecord>>> {
    let url = config.listing_url(country);
    info!(country = country, "Fetching filings listing");

    let response = client.get(&url).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        error!(
            country = country,
            status = status.as_u16(),
            "Filings listing request failed"
        );
        return Ok(None);
    }

    let mut page = parse_page(&response.text().await?)?;
    let mut pages = 1;
    let mut records = Vec::new();

    loop {
        let last_page = page.links.is_last_page();
        let next = page.links.next.take();
        records.extend(extract_filing_data(page));

        if last_page {
            break;
        }

        let next = next.ok_or_else(|| {
            AppError::ParseError("missing field `links.next` on a page that is not the last".into())
        })?;
        debug!(page = pages + 1, url = %next, "Fetching next filings page");
        page = fetch_page(client, &next).await?;
        pages += 1;
    }

    sort_filings(&mut records);
    info!(
        country = country,
        pages = pages,
        filings = records.len(),
        "Filings listing fetched"
    );

    Ok(Some(records))
}

/// Fetches a follow-up page without looking at the status code.
async fn fetch_page(client: &reqwest::Client, url: &str) -> AppResult<FilingPage> {
    let body = client.get(url).send().await?.text().await?;
    parse_page(&body)
}

fn parse_page(body: &str) -> AppResult<FilingPage> {
    serde_json::from_str(body)
        .map_err(|e| AppError::ParseError(format!("Invalid filings page: {e}")))
}

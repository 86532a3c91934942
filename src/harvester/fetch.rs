use anyhow::Context;
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::harvester::oai::{self, NO_RECORDS_MATCH};

use super::Harvester;

/// Request ListRecords pages until the resumption tokens run out and
/// return them as one harvest document.
pub(super) async fn run(harvester: &Harvester) -> anyhow::Result<String> {
    let config = &harvester.config;
    let mut pages = Vec::new();
    let mut total_records = 0usize;
    let mut token: Option<String> = None;

    loop {
        let url = config.list_records_url(token.as_deref())?;
        let body = fetch_page(&harvester.client, &url).await?;
        let page = oai::inspect_page(&body)
            .with_context(|| format!("Malformed OAI-PMH response from {}", url))?;

        if let Some(error) = &page.error {
            if error.code == NO_RECORDS_MATCH {
                warn!("No records matched for collection {}", config.collection);
            } else {
                anyhow::bail!("OAI-PMH request error from {}: {}", url, error);
            }
        }

        debug!(
            "Page {} returned {} record(s)",
            pages.len() + 1,
            page.records
        );
        total_records += page.records;
        pages.push(body);

        match page.resumption_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                anyhow::bail!("OAI-PMH endpoint repeated resumption token {}", next);
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    info!(
        "Harvested {} record(s) in {} page(s) from {}",
        total_records,
        pages.len(),
        config.endpoint()
    );
    Ok(oai::wrap_pages(&config.collection, &pages))
}

async fn fetch_page(client: &Client, url: &Url) -> anyhow::Result<String> {
    debug!("GET {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("{} returned {}", url, status);
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))
}

mod cache;
pub mod cli;
mod fetch;
pub mod oai;

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

pub use oai::{DEFAULT_BASE_URL, DEFAULT_CACHE_FILE, OaiConfig, UNTL_METADATA_PREFIX};

pub struct Harvester {
    config: OaiConfig,
    client: Client,
}

impl Harvester {
    pub fn new(config: OaiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.oai_timeout))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OaiConfig {
        &self.config
    }

    /// Harvest the collection over OAI-PMH and refresh the cache file.
    pub async fn harvest(&self) -> anyhow::Result<String> {
        info!("Harvesting records from {}", self.config.endpoint());

        let harvest = fetch::run(self).await?;
        cache::write(&self.config.cache_file, &harvest).await?;
        Ok(harvest)
    }

    /// Harvest text for this run. With `use_cache` an existing cache file
    /// is read instead of contacting the endpoint.
    pub async fn load(&self, use_cache: bool) -> anyhow::Result<String> {
        let cache_file = &self.config.cache_file;

        if use_cache {
            if cache_file.is_file() {
                info!("Using cached metadata from {}", cache_file.display());
                return cache::read(cache_file).await;
            }
            warn!(
                "Cache file {} was not found, harvesting instead",
                cache_file.display()
            );
        }

        self.harvest().await
    }
}

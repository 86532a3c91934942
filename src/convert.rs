use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use crate::{
    filter::filter_by_year,
    harvester::{Harvester, OaiConfig},
    untl::parse_collection,
    zotero::{ZoteroItem, map_record, rdf},
};

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub oai: OaiConfig,
    pub output: PathBuf,
    pub year: Option<i32>,
    pub use_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub harvested: usize,
    pub written: usize,
    pub output: PathBuf,
}

/// One conversion run: load the harvest, parse, filter, map, write.
pub struct Converter {
    harvester: Harvester,
    output: PathBuf,
    year: Option<i32>,
    use_cache: bool,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> anyhow::Result<Self> {
        Ok(Self {
            harvester: Harvester::new(config.oai)?,
            output: config.output,
            year: config.year,
            use_cache: config.use_cache,
        })
    }

    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let harvest = self.harvester.load(self.use_cache).await?;
        let records = parse_collection(&harvest).with_context(|| {
            format!(
                "Failed to parse UNTL metadata for collection {}",
                self.harvester.config().collection
            )
        })?;
        let harvested = records.len();

        let records = filter_by_year(records, self.year);
        if let Some(year) = self.year {
            info!("{} of {} record(s) created in {}", records.len(), harvested, year);
        }

        let items: Vec<ZoteroItem> = records.iter().map(map_record).collect();
        let output = rdf::write(&items, &self.output)?;

        info!("Wrote {} Zotero item(s) to {}", items.len(), output.display());
        Ok(RunSummary {
            harvested,
            written: items.len(),
            output,
        })
    }
}

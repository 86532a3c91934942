use std::path::{self, PathBuf};

use clap::Args;

use crate::{
    convert::ConvertConfig,
    expand_path,
    harvester::{DEFAULT_BASE_URL, DEFAULT_CACHE_FILE, OaiConfig, UNTL_METADATA_PREFIX},
    zotero::rdf::DEFAULT_OUTPUT,
};

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// UNT Digital Library collection id to process
    pub collection: String,

    /// Output file where Zotero RDF should be written
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Only include items created in the given year
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Use previously retrieved XML for the collection
    #[arg(long, default_value_t = false)]
    pub cache: bool,

    /// Where harvested XML is cached
    #[arg(long, default_value = DEFAULT_CACHE_FILE, env = "CACHE_FILE")]
    pub cache_file: PathBuf,

    /// Digital library base url
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "UNTL_BASE_URL")]
    pub base_url: String,

    /// Per-request timeout for OAI-PMH calls, in seconds
    #[arg(long, default_value_t = 60, env = "OAI_TIMEOUT")]
    pub oai_timeout: u64,
}

impl ConvertArgs {
    pub fn into_config(self) -> anyhow::Result<ConvertConfig> {
        let collection = self.collection.trim().to_string();
        if collection.is_empty() {
            anyhow::bail!("collection id must not be empty");
        }

        let oai = OaiConfig {
            cache_file: path::absolute(expand_path(&self.cache_file)?)?,
            base_url: self.base_url,
            collection,
            metadata_prefix: UNTL_METADATA_PREFIX.to_string(),
            oai_timeout: self.oai_timeout,
        };

        Ok(ConvertConfig {
            oai,
            output: path::absolute(expand_path(&self.output)?)?,
            year: self.year,
            use_cache: self.cache,
        })
    }
}

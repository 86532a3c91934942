mod convert;
pub mod filter;
mod harvester;
pub mod untl;
pub mod zotero;

use std::path::{Path, PathBuf};

pub use convert::{ConvertConfig, Converter, RunSummary};
pub use harvester::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_FILE, Harvester, OaiConfig, UNTL_METADATA_PREFIX,
    cli::ConvertArgs,
};

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)?;
    Ok(PathBuf::from(expanded.into_owned()))
}

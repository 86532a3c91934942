use std::path::Path;

use anyhow::Context;
use tokio::fs;

pub(super) async fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read cache file {}", path.display()))
}

/// Overwrite the cache with the latest harvest.
pub(super) async fn write(path: &Path, harvest: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
    }

    fs::write(path, harvest)
        .await
        .with_context(|| format!("Failed to write cache file {}", path.display()))
}

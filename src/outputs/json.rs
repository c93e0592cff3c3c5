//! JSON output: the ranked dataset and the per-month archive documents.
//!
//! `data/items.json` is the primary artifact — an ordered array of items
//! consumed by the rendering pages and the client-side search script. Each
//! archive group additionally gets its own document under `data/archive/`,
//! keyed by `YYYY-MM` (or `unknown`). Field names and the `date`/`image`
//! nullability contract are stable public interface; see
//! [`crate::models::NewsItem`].

use crate::models::NewsItem;
use std::collections::BTreeMap;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Write the ranked dataset to `{output_dir}/data/items.json`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, count = items.len()))]
pub async fn write_dataset(items: &[NewsItem], output_dir: &str) -> Result<(), Box<dyn Error>> {
    let data_dir = format!("{output_dir}/data");
    fs::create_dir_all(&data_dir).await?;

    let path = format!("{data_dir}/items.json");
    let json = serde_json::to_string_pretty(items)?;
    fs::write(&path, json).await?;
    info!(path = %path, "Wrote dataset");
    Ok(())
}

/// Write one JSON document per archive group to
/// `{output_dir}/data/archive/{key}.json`, each holding that group's items
/// in descending-date order.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, groups = groups.len()))]
pub async fn write_archive_groups(
    groups: &BTreeMap<String, Vec<NewsItem>>,
    output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let archive_dir = format!("{output_dir}/data/archive");
    fs::create_dir_all(&archive_dir).await?;

    for (key, items) in groups {
        let path = format!("{archive_dir}/{key}.json");
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&path, json).await?;
        info!(path = %path, count = items.len(), "Wrote archive group");
    }
    Ok(())
}

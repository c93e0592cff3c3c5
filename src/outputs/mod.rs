//! Output generation for the emitted dataset and the browsing site.
//!
//! # Submodules
//!
//! - [`json`]: the dataset (`data/items.json`) and one JSON document per
//!   archive group (`data/archive/{YYYY-MM}.json`)
//! - [`site`]: the static browsing site (home shell, archive pages, assets)
//!
//! # Output Structure
//!
//! ```text
//! output/
//! ├── .nojekyll
//! ├── index.html
//! ├── data/
//! │   ├── items.json
//! │   └── archive/
//! │       ├── 2025-08.json
//! │       └── unknown.json
//! ├── archive/
//! │   ├── index.html
//! │   ├── 2025-08.html
//! │   └── unknown.html
//! └── static/
//!     ├── styles.css
//!     └── app.js
//! ```
//!
//! Everything here is recomputed and overwritten on every run; archive pages
//! are never merged with a previous run's output.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

pub mod json;
pub mod site;

/// Ensure the output directory exists and is writable before fetching
/// anything, by creating it and probing with a throwaway file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

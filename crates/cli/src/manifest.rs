//! Book manifest read by the download command

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One book to download: title, optional cover, the page URL the
/// chapter list was scraped from, and the chapters themselves.
#[derive(Debug, Deserialize)]
pub struct BookManifest {
    pub title: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Matched against the source catalog to pick mirrors for relative
    /// chapter URLs
    #[serde(default)]
    pub page_url: Option<String>,
    pub chapters: Vec<ManifestChapter>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestChapter {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub duration: String,
}

impl BookManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing manifest {}", path.display()))
    }
}

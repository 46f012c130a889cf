//! Runtime configuration.

use crate::source::{ConfiguredSource, FsSource, HttpSource};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_TOPICS_FILE: &str = "topics.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Directory holding `manifest.json` and `exercises/`.
    pub data_dir: PathBuf,
    /// Fetch over HTTP from this base instead of the filesystem.
    pub base_url: Option<String>,
    /// Records fetched per batch.
    pub batch_size: usize,
    /// Taxonomy description, relative to the data directory or base URL.
    pub topics_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            base_url: None,
            batch_size: DEFAULT_BATCH_SIZE,
            topics_file: DEFAULT_TOPICS_FILE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Read the configuration from the environment, honoring a `.env` file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unusable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let batch_size = match lookup("CATALOG_BATCH_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => {
                    warn!("Ignoring CATALOG_BATCH_SIZE={:?}, using {}", raw, default.batch_size);
                    default.batch_size
                }
                Ok(size) => size,
            },
            None => default.batch_size,
        };

        Self {
            data_dir: lookup("EXERCISES_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.data_dir),
            base_url: lookup("EXERCISES_BASE_URL").filter(|url| !url.trim().is_empty()),
            batch_size,
            topics_file: lookup("TOPICS_FILE").unwrap_or(default.topics_file),
        }
    }

    /// The record source this configuration points at.
    pub fn source(&self) -> ConfiguredSource {
        match &self.base_url {
            Some(url) => ConfiguredSource::Http(
                HttpSource::new(url.clone()).with_topics_file(self.topics_file.clone()),
            ),
            None => ConfiguredSource::Fs(
                FsSource::new(self.data_dir.clone()).with_topics_file(self.topics_file.clone()),
            ),
        }
    }
}

//! Where manifests, records and taxonomy descriptions come from.
//!
//! Layout shared by the filesystem and HTTP sources:
//! ```text
//! <root>/manifest.json        ["newest.json", "older.json", ...]
//! <root>/exercises/<entry>    one record per manifest entry
//! <root>/topics.json          optional taxonomy description
//! ```

use crate::error::SourceError;
use exercise_core::{decode, Exercise};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const EXERCISES_DIR: &str = "exercises";

/// A store the catalog loader reads from.
pub trait RecordSource: Send + Sync + 'static {
    /// Ordered record entries, newest first.
    fn fetch_manifest(&self) -> impl Future<Output = Result<Vec<String>, SourceError>> + Send;

    /// Fetch and decode the record behind one manifest entry.
    fn fetch_record(
        &self,
        entry: &str,
    ) -> impl Future<Output = Result<Exercise, SourceError>> + Send;

    /// Raw taxonomy description, or `None` when the source has none.
    fn fetch_taxonomy(&self) -> impl Future<Output = Result<Option<String>, SourceError>> + Send;
}

fn parse_manifest(bytes: &[u8]) -> Result<Vec<String>, SourceError> {
    serde_json::from_slice(bytes).map_err(|e| SourceError::Parse(format!("manifest: {}", e)))
}

/// Records stored on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    topics_file: String,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            topics_file: crate::config::DEFAULT_TOPICS_FILE.to_string(),
        }
    }

    pub fn with_topics_file(mut self, topics_file: impl Into<String>) -> Self {
        self.topics_file = topics_file.into();
        self
    }

    async fn read(&self, path: PathBuf) -> Result<Vec<u8>, SourceError> {
        tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::FileSystem {
                path: path.display().to_string(),
                source,
            })
    }
}

impl RecordSource for FsSource {
    async fn fetch_manifest(&self) -> Result<Vec<String>, SourceError> {
        let bytes = self.read(self.root.join(MANIFEST_FILE)).await?;
        parse_manifest(&bytes)
    }

    async fn fetch_record(&self, entry: &str) -> Result<Exercise, SourceError> {
        let bytes = self.read(self.root.join(EXERCISES_DIR).join(entry)).await?;
        Ok(decode(&bytes)?)
    }

    async fn fetch_taxonomy(&self) -> Result<Option<String>, SourceError> {
        let path = self.root.join(&self.topics_file);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SourceError::FileSystem {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// Records served over HTTP from a static base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    topics_file: String,
}

impl HttpSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            topics_file: crate::config::DEFAULT_TOPICS_FILE.to_string(),
        }
    }

    pub fn with_topics_file(mut self, topics_file: impl Into<String>) -> Self {
        self.topics_file = topics_file.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a path below the base. A 404 yields `None`.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Backend {
                status: resp.status().as_u16(),
                url,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

impl RecordSource for HttpSource {
    async fn fetch_manifest(&self) -> Result<Vec<String>, SourceError> {
        let bytes = self
            .get(MANIFEST_FILE)
            .await?
            .ok_or_else(|| SourceError::Missing(MANIFEST_FILE.to_string()))?;
        parse_manifest(&bytes)
    }

    async fn fetch_record(&self, entry: &str) -> Result<Exercise, SourceError> {
        let path = format!("{}/{}", EXERCISES_DIR, entry);
        let bytes = self
            .get(&path)
            .await?
            .ok_or_else(|| SourceError::Missing(path.clone()))?;
        Ok(decode(&bytes)?)
    }

    async fn fetch_taxonomy(&self) -> Result<Option<String>, SourceError> {
        match self.get(&self.topics_file).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| SourceError::Parse(format!("{}: {}", self.topics_file, e))),
            None => Ok(None),
        }
    }
}

/// Records held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    manifest: Vec<String>,
    records: HashMap<String, String>,
    taxonomy: Option<String>,
    latency: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a manifest entry backed by a JSON record.
    pub fn with_record(mut self, entry: impl Into<String>, json: impl Into<String>) -> Self {
        let entry = entry.into();
        self.records.insert(entry.clone(), json.into());
        self.manifest.push(entry);
        self
    }

    /// Append a manifest entry with nothing behind it.
    pub fn with_dangling_entry(mut self, entry: impl Into<String>) -> Self {
        self.manifest.push(entry.into());
        self
    }

    pub fn with_taxonomy(mut self, json: impl Into<String>) -> Self {
        self.taxonomy = Some(json.into());
        self
    }

    /// Delay every record fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Record fetches issued so far, across clones.
    pub fn record_fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RecordSource for MemorySource {
    async fn fetch_manifest(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.manifest.clone())
    }

    async fn fetch_record(&self, entry: &str) -> Result<Exercise, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let json = self
            .records
            .get(entry)
            .ok_or_else(|| SourceError::Missing(entry.to_string()))?;
        Ok(decode(json.as_bytes())?)
    }

    async fn fetch_taxonomy(&self) -> Result<Option<String>, SourceError> {
        Ok(self.taxonomy.clone())
    }
}

/// The source selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Fs(FsSource),
    Http(HttpSource),
}

impl RecordSource for ConfiguredSource {
    async fn fetch_manifest(&self) -> Result<Vec<String>, SourceError> {
        match self {
            Self::Fs(source) => source.fetch_manifest().await,
            Self::Http(source) => source.fetch_manifest().await,
        }
    }

    async fn fetch_record(&self, entry: &str) -> Result<Exercise, SourceError> {
        match self {
            Self::Fs(source) => source.fetch_record(entry).await,
            Self::Http(source) => source.fetch_record(entry).await,
        }
    }

    async fn fetch_taxonomy(&self) -> Result<Option<String>, SourceError> {
        match self {
            Self::Fs(source) => source.fetch_taxonomy().await,
            Self::Http(source) => source.fetch_taxonomy().await,
        }
    }
}

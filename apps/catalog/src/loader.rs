//! Batched catalog loader.
//!
//! The manifest is read once, then records are fetched in fixed-size slices
//! and appended to the catalog in manifest order. At most one batch is in
//! flight; a request that arrives while one is outstanding is a no-op.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::{CatalogError, Result};
use crate::source::RecordSource;
use exercise_core::{classify_source, Catalog, Exercise, Taxonomy};
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info, warn};

/// Load status for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum LoadState {
    Idle,
    Loading,
    Complete,
    Failed { error: String },
}

/// Pagination counters. `loaded_count` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub loaded_count: usize,
    /// `None` until the manifest has been read.
    pub manifest_length: Option<usize>,
    pub is_loading: bool,
}

impl Pagination {
    /// Whether a further batch could add records.
    pub fn has_more(&self) -> bool {
        self.manifest_length
            .map_or(true, |len| self.loaded_count < len)
    }
}

/// What a call to [`CatalogLoader::load_next_batch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Loaded { added: usize },
    /// Another batch was already in flight.
    InFlight,
    Exhausted,
}

/// Tag a freshly decoded record with its source and subsource.
pub fn enrich_exercise(mut exercise: Exercise) -> Exercise {
    exercise.source = Some(classify_source(exercise.category.as_deref(), exercise.grade));
    exercise
}

struct LoaderState {
    manifest: Option<Arc<Vec<String>>>,
    catalog: Catalog,
    loaded_count: usize,
    load_state: LoadState,
}

/// Inner state shared across clones.
struct LoaderInner<S> {
    source: S,
    batch_size: usize,
    state: Mutex<LoaderState>,
    loading: AtomicBool,
    settled: Notify,
}

/// Clears the in-flight flag and wakes waiters when a batch attempt ends.
struct InFlight<'a> {
    loading: &'a AtomicBool,
    settled: &'a Notify,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::Release);
        self.settled.notify_waiters();
    }
}

/// Catalog loader handle.
///
/// Clone-able: all state lives behind an `Arc`, so the handle can be moved
/// into spawned tasks without holding locks across awaits.
pub struct CatalogLoader<S> {
    inner: Arc<LoaderInner<S>>,
}

impl<S> Clone for CatalogLoader<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RecordSource> CatalogLoader<S> {
    pub fn new(source: S, batch_size: usize) -> Self {
        let batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        Self {
            inner: Arc::new(LoaderInner {
                source,
                batch_size,
                state: Mutex::new(LoaderState {
                    manifest: None,
                    catalog: Catalog::new(),
                    loaded_count: 0,
                    load_state: LoadState::Idle,
                }),
                loading: AtomicBool::new(false),
                settled: Notify::new(),
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    pub fn batch_size(&self) -> usize {
        self.inner.batch_size
    }

    pub async fn pagination(&self) -> Pagination {
        let state = self.inner.state.lock().await;
        Pagination {
            loaded_count: state.loaded_count,
            manifest_length: state.manifest.as_ref().map(|m| m.len()),
            is_loading: self.inner.loading.load(Ordering::Acquire),
        }
    }

    pub async fn load_state(&self) -> LoadState {
        self.inner.state.lock().await.load_state.clone()
    }

    /// Snapshot of the records loaded so far. Records are shared, not copied.
    pub async fn catalog(&self) -> Catalog {
        self.inner.state.lock().await.catalog.clone()
    }

    /// Fetch the next slice of the manifest and append it to the catalog.
    ///
    /// A failing record aborts the whole batch: nothing from it is appended,
    /// `loaded_count` stays put and the batch can be retried.
    pub async fn load_next_batch(&self) -> Result<BatchOutcome> {
        if self.inner.loading.swap(true, Ordering::AcqRel) {
            debug!("Batch already in flight, ignoring request");
            return Ok(BatchOutcome::InFlight);
        }
        let _guard = InFlight {
            loading: &self.inner.loading,
            settled: &self.inner.settled,
        };

        let entries = {
            let manifest = self.ensure_manifest().await?;
            let mut state = self.inner.state.lock().await;
            let start = state.loaded_count;
            if start >= manifest.len() {
                state.load_state = LoadState::Complete;
                return Ok(BatchOutcome::Exhausted);
            }
            let end = (start + self.inner.batch_size).min(manifest.len());
            state.load_state = LoadState::Loading;
            manifest[start..end].to_vec()
        };

        debug!("Fetching batch of {} records", entries.len());
        let results = join_all(
            entries
                .iter()
                .map(|entry| self.inner.source.fetch_record(entry)),
        )
        .await;

        let mut batch = Vec::with_capacity(results.len());
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(exercise) => batch.push(enrich_exercise(exercise)),
                Err(source) => {
                    let err = CatalogError::Record {
                        id: entry.clone(),
                        source,
                    };
                    error!("Batch load failed: {}", err);
                    self.set_load_state(LoadState::Failed {
                        error: err.to_string(),
                    })
                    .await;
                    return Err(err);
                }
            }
        }

        let added = batch.len();
        let mut state = self.inner.state.lock().await;
        state.catalog.extend(batch);
        state.loaded_count += added;
        let total = state.manifest.as_ref().map_or(0, |m| m.len());
        state.load_state = if state.loaded_count >= total {
            info!("Catalog complete with {} records", state.loaded_count);
            LoadState::Complete
        } else {
            LoadState::Idle
        };
        debug!("Loaded {}/{} records", state.loaded_count, total);

        Ok(BatchOutcome::Loaded { added })
    }

    /// Load batches until the manifest is exhausted.
    ///
    /// Waits out a batch started elsewhere instead of skipping it, so on
    /// success every manifest entry is in the catalog. A no-op once exhausted.
    pub async fn load_all(&self) -> Result<()> {
        loop {
            let settled = self.inner.settled.notified();
            tokio::pin!(settled);
            settled.as_mut().enable();

            match self.load_next_batch().await? {
                BatchOutcome::Loaded { .. } => continue,
                BatchOutcome::Exhausted => return Ok(()),
                BatchOutcome::InFlight => {
                    if self.inner.loading.load(Ordering::Acquire) {
                        settled.await;
                    }
                }
            }
        }
    }

    /// Read the topic taxonomy from the source.
    ///
    /// Falls back to the bundled hierarchy when the source has no description,
    /// and to an empty one when the description cannot be fetched.
    pub async fn load_taxonomy(&self) -> Taxonomy {
        match self.inner.source.fetch_taxonomy().await {
            Ok(Some(json)) => Taxonomy::load(&json),
            Ok(None) => {
                debug!("No taxonomy description, using the bundled one");
                Taxonomy::builtin()
            }
            Err(e) => {
                warn!("Failed to fetch taxonomy: {}", e);
                Taxonomy::empty()
            }
        }
    }

    async fn ensure_manifest(&self) -> Result<Arc<Vec<String>>> {
        if let Some(manifest) = &self.inner.state.lock().await.manifest {
            return Ok(Arc::clone(manifest));
        }

        match self.inner.source.fetch_manifest().await {
            Ok(manifest) => {
                info!("Manifest lists {} records", manifest.len());
                let manifest = Arc::new(manifest);
                self.inner.state.lock().await.manifest = Some(Arc::clone(&manifest));
                Ok(manifest)
            }
            Err(e) => {
                let err = CatalogError::Manifest(e);
                error!("{}", err);
                self.set_load_state(LoadState::Failed {
                    error: err.to_string(),
                })
                .await;
                Err(err)
            }
        }
    }

    async fn set_load_state(&self, load_state: LoadState) {
        self.inner.state.lock().await.load_state = load_state;
    }
}

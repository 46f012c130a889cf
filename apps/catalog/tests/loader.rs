//! Batched loading against in-memory sources.

mod common;

use std::time::Duration;

use exercise_catalog::{BatchOutcome, CatalogError, CatalogLoader, FsSource, LoadState};
use pretty_assertions::assert_eq;

use common::fixtures;

async fn loaded_ids<S: exercise_catalog::RecordSource>(loader: &CatalogLoader<S>) -> Vec<String> {
    loader
        .catalog()
        .await
        .records()
        .iter()
        .map(|ex| ex.id.clone())
        .collect()
}

/// 25 entries in batches of 10: one batch, then the rest, then nothing.
#[tokio::test]
async fn test_first_batch_then_drain() {
    let loader = CatalogLoader::new(fixtures::numbered_source(25), 10);

    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        BatchOutcome::Loaded { added: 10 }
    );
    let pagination = loader.pagination().await;
    assert_eq!(pagination.loaded_count, 10);
    assert_eq!(pagination.manifest_length, Some(25));
    assert!(pagination.has_more());
    assert_eq!(loaded_ids(&loader).await, fixtures::ids(0, 10));

    loader.load_all().await.unwrap();
    assert_eq!(loader.pagination().await.loaded_count, 25);
    assert_eq!(loaded_ids(&loader).await, fixtures::ids(0, 25));
    assert_eq!(loader.load_state().await, LoadState::Complete);

    let fetches = loader.source().record_fetches();
    assert_eq!(loader.load_next_batch().await.unwrap(), BatchOutcome::Exhausted);
    loader.load_all().await.unwrap();
    assert_eq!(loader.source().record_fetches(), fetches);
    assert_eq!(loader.pagination().await.loaded_count, 25);
}

/// A request while a batch is outstanding does nothing.
#[tokio::test]
async fn test_request_during_batch_is_ignored() {
    let source = fixtures::numbered_source(25).with_latency(Duration::from_millis(50));
    let loader = CatalogLoader::new(source, 10);

    let (first, second) = tokio::join!(loader.load_next_batch(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let pagination = loader.pagination().await;
        assert!(pagination.is_loading);
        loader.load_next_batch().await
    });

    assert_eq!(first.unwrap(), BatchOutcome::Loaded { added: 10 });
    assert_eq!(second.unwrap(), BatchOutcome::InFlight);
    assert_eq!(loader.source().record_fetches(), 10);
    assert_eq!(loader.pagination().await.loaded_count, 10);
    assert!(!loader.pagination().await.is_loading);
}

/// Two drains racing each other fetch every record exactly once.
#[tokio::test]
async fn test_concurrent_load_all() {
    let source = fixtures::numbered_source(25).with_latency(Duration::from_millis(5));
    let loader = CatalogLoader::new(source, 10);
    let other = loader.clone();

    let (a, b) = tokio::join!(loader.load_all(), other.load_all());
    a.unwrap();
    b.unwrap();

    assert_eq!(loader.source().record_fetches(), 25);
    assert_eq!(loaded_ids(&loader).await, fixtures::ids(0, 25));
}

/// A drain spawned on a cloned handle fills the shared catalog.
#[tokio::test]
async fn test_spawned_drain_shares_catalog() {
    let loader = CatalogLoader::new(fixtures::numbered_source(12), 5);
    let handle = loader.clone();
    tokio::spawn(async move { handle.load_all().await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(loader.catalog().await.len(), 12);
    assert_eq!(loader.load_state().await, LoadState::Complete);
}

#[tokio::test]
async fn test_loaded_count_never_decreases() {
    let source = fixtures::numbered_source(10).with_dangling_entry("gone.json");
    let loader = CatalogLoader::new(source, 4);

    let mut counts = vec![loader.pagination().await.loaded_count];
    for _ in 0..6 {
        let _ = loader.load_next_batch().await;
        counts.push(loader.pagination().await.loaded_count);
    }

    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
    assert_eq!(*counts.last().unwrap(), 8);
}

/// A failing record rejects its whole batch; earlier batches stay.
#[tokio::test]
async fn test_failed_batch_keeps_prefix_and_retries() {
    let source = fixtures::numbered_source(12).with_dangling_entry("gone.json");
    let loader = CatalogLoader::new(source, 10);

    loader.load_next_batch().await.unwrap();
    let err = loader.load_all().await.unwrap_err();
    assert!(matches!(err, CatalogError::Record { ref id, .. } if id == "gone.json"));
    assert_eq!(loader.pagination().await.loaded_count, 10);
    assert!(matches!(loader.load_state().await, LoadState::Failed { .. }));

    let fetches = loader.source().record_fetches();
    assert!(loader.load_next_batch().await.is_err());
    assert_eq!(loader.source().record_fetches(), fetches + 3);
    assert_eq!(loaded_ids(&loader).await, fixtures::ids(0, 10));
}

#[tokio::test]
async fn test_missing_manifest_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CatalogLoader::new(FsSource::new(dir.path()), 10);

    let err = loader.load_next_batch().await.unwrap_err();
    assert!(matches!(err, CatalogError::Manifest(_)));
    assert!(matches!(loader.load_state().await, LoadState::Failed { .. }));
    assert_eq!(loader.pagination().await.manifest_length, None);
}

#[tokio::test]
async fn test_records_are_tagged_with_source() {
    let source = exercise_catalog::MemorySource::new()
        .with_record("a.json", fixtures::with_solution("a", 12, "VBE-2025-2", "s"))
        .with_record("b.json", fixtures::free_text("b", 11, "Energija", "1"))
        .with_record("c.json", fixtures::free_text("c", 9, "Optika", "1"));
    let loader = CatalogLoader::new(source, 10);
    loader.load_all().await.unwrap();

    let catalog = loader.catalog().await;
    let tag = |id: &str| catalog.get(id).unwrap().source.clone().unwrap();
    assert_eq!(tag("a").source, "VBE");
    assert_eq!(tag("a").subsource.as_deref(), Some("2025 (2)"));
    assert_eq!(tag("b").subsource.as_deref(), Some("2025 (1)"));
    assert_eq!(tag("c").source, "Kita");
    assert_eq!(tag("c").subsource, None);
}

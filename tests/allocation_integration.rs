//! Short code allocation against a real store
//!
//! Collisions are scripted by pre-inserting codes and feeding the allocator
//! a fixed sequence of candidates.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tinyrl::models::{
    BrowserClicks, ClickEvent, CountryClicks, DailyClicks, NewClick, ReferrerClicks, ShortLink,
};
use tinyrl::shortener::{
    allocate, allocate_with, AllocationError, MAX_ALLOCATION_ATTEMPTS, RESERVED_CODES,
};
use tinyrl::storage::{
    SeedTransaction, SqliteStorage, Storage, StorageError, StorageResult, StoreHealth,
};

async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Store with `taken0`..`taken{n-1}` already present
async fn storage_with_taken(n: usize) -> Arc<dyn Storage> {
    let storage = create_test_storage().await;
    for i in 0..n {
        storage
            .create_with_code(&format!("taken{i}"), "https://example.com/existing")
            .await
            .unwrap();
    }
    storage
}

/// Yields the taken codes first, then fresh ones
fn scripted(collisions: usize) -> impl FnMut() -> String {
    let mut calls = 0;
    move || {
        let code = if calls < collisions {
            format!("taken{calls}")
        } else {
            format!("fresh{calls}")
        };
        calls += 1;
        code
    }
}

#[tokio::test]
async fn test_allocation_without_collision() {
    let storage = create_test_storage().await;

    let link = allocate(storage.as_ref(), "https://example.com/page")
        .await
        .unwrap();

    assert_eq!(link.code.len(), 6);
    assert_eq!(link.destination, "https://example.com/page");
    let stored = storage.get(&link.code).await.unwrap().unwrap();
    assert_eq!(stored, link);
}

#[tokio::test]
async fn test_allocation_recovers_from_collisions() {
    for collisions in 0..MAX_ALLOCATION_ATTEMPTS {
        let storage = storage_with_taken(collisions).await;

        let link = allocate_with(
            storage.as_ref(),
            "https://example.com/new",
            scripted(collisions),
        )
        .await
        .unwrap();

        assert_eq!(link.code, format!("fresh{collisions}"));
        assert_eq!(
            storage.link_count().await.unwrap(),
            collisions as i64 + 1,
            "exactly one new row after {collisions} collisions"
        );
    }
}

#[tokio::test]
async fn test_allocation_exhausts_after_bound() {
    let storage = storage_with_taken(MAX_ALLOCATION_ATTEMPTS).await;

    let result = allocate_with(
        storage.as_ref(),
        "https://example.com/new",
        scripted(MAX_ALLOCATION_ATTEMPTS),
    )
    .await;

    match result {
        Err(AllocationError::Exhausted { attempts }) => {
            assert_eq!(attempts, MAX_ALLOCATION_ATTEMPTS)
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(
        storage.link_count().await.unwrap(),
        MAX_ALLOCATION_ATTEMPTS as i64
    );
}

#[tokio::test]
async fn test_existing_links_untouched_by_collision() {
    let storage = storage_with_taken(1).await;

    allocate_with(storage.as_ref(), "https://example.com/new", scripted(1))
        .await
        .unwrap();

    let existing = storage.get("taken0").await.unwrap().unwrap();
    assert_eq!(existing.destination, "https://example.com/existing");
}

#[tokio::test]
async fn test_reserved_route_codes_are_skipped() {
    let storage = create_test_storage().await;
    let mut candidates = vec!["health".to_string(), "fresh1".to_string()].into_iter();

    let link = allocate_with(storage.as_ref(), "https://example.com/new", move || {
        candidates.next().unwrap()
    })
    .await
    .unwrap();

    assert_eq!(link.code, "fresh1");
    assert!(storage.get("health").await.unwrap().is_none());
    assert_eq!(storage.link_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_only_reserved_codes_exhausts() {
    let storage = create_test_storage().await;

    let result = allocate_with(storage.as_ref(), "https://example.com/new", || {
        RESERVED_CODES[0].to_string()
    })
    .await;

    assert!(matches!(
        result,
        Err(AllocationError::Exhausted { attempts }) if attempts == MAX_ALLOCATION_ATTEMPTS
    ));
    assert_eq!(storage.link_count().await.unwrap(), 0);
}

/// Store whose inserts always fail with a non-conflict error
#[derive(Default)]
struct BrokenStorage {
    inserts: AtomicUsize,
}

#[async_trait]
impl Storage for BrokenStorage {
    async fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create_with_code(&self, _code: &str, _destination: &str) -> StorageResult<ShortLink> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Other(anyhow::anyhow!("disk I/O error")))
    }

    async fn get(&self, _code: &str) -> anyhow::Result<Option<ShortLink>> {
        Ok(None)
    }

    async fn update_destination(&self, _code: &str, _destination: &str) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn record_click(&self, _click: &NewClick) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_clicks(&self, _code: &str, _limit: i64) -> anyhow::Result<Vec<ClickEvent>> {
        Ok(Vec::new())
    }

    async fn clicks_per_day(&self, _code: &str) -> anyhow::Result<Vec<DailyClicks>> {
        Ok(Vec::new())
    }

    async fn clicks_per_browser(&self, _code: &str) -> anyhow::Result<Vec<BrowserClicks>> {
        Ok(Vec::new())
    }

    async fn clicks_per_referrer(&self, _code: &str) -> anyhow::Result<Vec<ReferrerClicks>> {
        Ok(Vec::new())
    }

    async fn clicks_per_country(&self, _code: &str) -> anyhow::Result<Vec<CountryClicks>> {
        Ok(Vec::new())
    }

    async fn link_count(&self) -> anyhow::Result<i64> {
        Ok(0)
    }

    async fn click_count(&self, _code: &str) -> anyhow::Result<i64> {
        Ok(0)
    }

    async fn health(&self) -> anyhow::Result<StoreHealth> {
        anyhow::bail!("unavailable")
    }

    async fn close(&self) {}

    async fn begin_seed(&self) -> anyhow::Result<Box<dyn SeedTransaction>> {
        anyhow::bail!("unavailable")
    }
}

#[tokio::test]
async fn test_non_conflict_error_aborts_immediately() {
    let storage = BrokenStorage::default();

    let result = allocate(&storage, "https://example.com/new").await;

    assert!(matches!(result, Err(AllocationError::Storage(_))));
    assert_eq!(storage.inserts.load(Ordering::SeqCst), 1);
}

//! Seed runs against an in-memory SQLite store

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tinyrl::analytics::{Anonymizer, ClickRecorder, Country, NullResolver};
use tinyrl::models::NewClick;
use tinyrl::seed::{self, DateRange, SeedOptions, DEMO_CODE, MAX_DAILY_CLICKS, MIN_DAILY_CLICKS};
use tinyrl::storage::{SeedTransaction, SqliteStorage, Storage};

async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn recorder() -> ClickRecorder {
    ClickRecorder::new(
        Anonymizer::new("seed-test-salt"),
        Arc::new(NullResolver),
        Country::new("India", "IN"),
    )
}

fn single_day(day: &str) -> SeedOptions {
    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
    SeedOptions::new(DateRange::new(day, day).unwrap())
}

#[tokio::test]
async fn test_single_day_seed() {
    let storage = create_test_storage().await;
    let options = single_day("2025-04-01");

    let report = seed::seed(
        storage.as_ref(),
        &options,
        &recorder(),
        &mut StdRng::seed_from_u64(7),
    )
    .await
    .unwrap();

    let count = storage.click_count(DEMO_CODE).await.unwrap();
    assert!((MIN_DAILY_CLICKS as i64..MAX_DAILY_CLICKS as i64).contains(&count));
    assert_eq!(report.inserted, count as u64);
    assert_eq!(report.days, 1);
    assert_eq!(report.batches, 1);

    let daily = storage.clicks_per_day(DEMO_CODE).await.unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].day, "2025-04-01");
    assert_eq!(daily[0].click_count, count);

    let clicks = storage.list_clicks(DEMO_CODE, 1000).await.unwrap();
    for click in &clicks {
        assert_eq!(click.anonymized_ip.len(), 64);
        assert_eq!(click.country_iso_code, "IN");
    }
}

#[tokio::test]
async fn test_same_rng_seed_reproduces_rows() {
    let mut runs = Vec::new();

    for _ in 0..2 {
        let storage = create_test_storage().await;
        seed::seed(
            storage.as_ref(),
            &single_day("2025-04-01"),
            &recorder(),
            &mut StdRng::seed_from_u64(1234),
        )
        .await
        .unwrap();

        let rows: Vec<_> = storage
            .list_clicks(DEMO_CODE, 1000)
            .await
            .unwrap()
            .into_iter()
            .map(|c| {
                (
                    c.occurred_at,
                    c.browser,
                    c.user_agent,
                    c.referrer,
                    c.anonymized_ip,
                )
            })
            .collect();
        runs.push(rows);
    }

    assert!(!runs[0].is_empty());
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_full_year_is_batched() {
    let storage = create_test_storage().await;
    let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let options = SeedOptions::new(DateRange::year_ending(end).unwrap());

    let report = seed::seed(
        storage.as_ref(),
        &options,
        &recorder(),
        &mut StdRng::seed_from_u64(99),
    )
    .await
    .unwrap();

    assert_eq!(report.days, 366);
    assert_eq!(
        storage.click_count(DEMO_CODE).await.unwrap() as u64,
        report.inserted
    );
    assert_eq!(
        report.batches as u64,
        report.inserted.div_ceil(options.batch_size as u64)
    );

    let daily = storage.clicks_per_day(DEMO_CODE).await.unwrap();
    assert_eq!(daily.len(), 366);
    assert_eq!(daily.first().unwrap().day, "2024-06-30");
    assert_eq!(daily.last().unwrap().day, "2025-06-30");
    assert!(daily
        .iter()
        .all(|d| (MIN_DAILY_CLICKS as i64..MAX_DAILY_CLICKS as i64).contains(&d.click_count)));
}

#[tokio::test]
async fn test_rerun_keeps_single_demo_link() {
    let storage = create_test_storage().await;

    for rng_seed in [1, 2] {
        seed::seed(
            storage.as_ref(),
            &single_day("2025-04-01"),
            &recorder(),
            &mut StdRng::seed_from_u64(rng_seed),
        )
        .await
        .unwrap();
    }

    assert_eq!(storage.link_count().await.unwrap(), 1);
}

/// Delegates to a real transaction but fails the n-th click batch
struct FailingTx {
    inner: Box<dyn SeedTransaction>,
    fail_on: usize,
    calls: usize,
}

#[async_trait]
impl SeedTransaction for FailingTx {
    async fn ensure_link(&mut self, code: &str, destination: &str) -> anyhow::Result<()> {
        self.inner.ensure_link(code, destination).await
    }

    async fn insert_clicks(&mut self, clicks: &[NewClick]) -> anyhow::Result<u64> {
        self.calls += 1;
        if self.calls == self.fail_on {
            anyhow::bail!("connection reset");
        }
        self.inner.insert_clicks(clicks).await
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.commit().await
    }
}

#[tokio::test]
async fn test_failed_batch_leaves_nothing_behind() {
    let storage = create_test_storage().await;
    let mut options = single_day("2025-04-01");
    options.batch_size = 10;

    {
        let mut tx = FailingTx {
            inner: storage.begin_seed().await.unwrap(),
            fail_on: 2,
            calls: 0,
        };

        let result = seed::seed_into(
            &mut tx,
            &options,
            &recorder(),
            &mut StdRng::seed_from_u64(5),
        )
        .await;

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("connection reset"));
        assert_eq!(tx.calls, 2);
    }

    assert_eq!(storage.link_count().await.unwrap(), 0);
    assert_eq!(storage.click_count(DEMO_CODE).await.unwrap(), 0);
}

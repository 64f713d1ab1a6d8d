//! Synthetic click history for the demo link
//!
//! A run generates 30 to 49 clicks for every calendar day of the range,
//! enriches them exactly like live traffic, and writes them in batches
//! inside a single transaction. Either the whole range lands or nothing does.

pub mod batch;
pub mod pools;

use anyhow::{Context, Result};
use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::RngExt;
use std::time::Instant;
use tracing::info;

use crate::analytics::{ClickRecorder, RawClick};
use crate::storage::{SeedTransaction, Storage};

pub use batch::{ClickBatch, DEFAULT_BATCH_SIZE};

pub const DEMO_CODE: &str = "demo-code";
pub const DEMO_URL: &str = "https://github.com/scythe504/tiny-rl";

/// Clicks per day are drawn from `MIN_DAILY_CLICKS..MAX_DAILY_CLICKS`
pub const MIN_DAILY_CLICKS: usize = 30;
pub const MAX_DAILY_CLICKS: usize = 50;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const PROGRESS_EVERY_DAYS: usize = 30;

/// Inclusive range of UTC calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        anyhow::ensure!(start <= end, "seed range start {start} is after end {end}");
        Ok(Self { start, end })
    }

    /// `[end - 1 year, end]`
    pub fn year_ending(end: NaiveDate) -> Result<Self> {
        let start = end
            .checked_sub_months(Months::new(12))
            .with_context(|| format!("cannot go back one year from {end}"))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub range: DateRange,
    pub demo_code: String,
    pub demo_url: String,
    pub batch_size: usize,
}

impl SeedOptions {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            demo_code: DEMO_CODE.to_string(),
            demo_url: DEMO_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub batches: usize,
    pub days: usize,
}

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

/// Pre-hash clicks for one day. Every timestamp falls inside `day` (UTC).
pub fn generate_day(day: NaiveDate, rng: &mut StdRng) -> Vec<RawClick<'static>> {
    let day_start: DateTime<Utc> = day.and_time(NaiveTime::MIN).and_utc();
    let count = rng.random_range(MIN_DAILY_CLICKS..MAX_DAILY_CLICKS);

    (0..count)
        .map(|_| {
            let ip = pick(rng, pools::IPS);
            let offset = rng.random_range(0..SECONDS_PER_DAY);
            RawClick {
                ip,
                browser: pick(rng, pools::BROWSERS),
                user_agent: pick(rng, pools::USER_AGENTS),
                referrer: pick(rng, pools::REFERRERS),
                at: day_start + TimeDelta::seconds(offset),
            }
        })
        .collect()
}

/// Generate and insert the whole range through `tx` without committing
pub async fn seed_into(
    tx: &mut dyn SeedTransaction,
    options: &SeedOptions,
    recorder: &ClickRecorder,
    rng: &mut StdRng,
) -> Result<SeedReport> {
    tx.ensure_link(&options.demo_code, &options.demo_url)
        .await
        .context("failed to insert demo link")?;
    info!(code = %options.demo_code, "demo link inserted or already present");

    let started = Instant::now();
    let mut batch = ClickBatch::new(options.batch_size);
    let mut days = 0;

    for day in options.range.days() {
        days += 1;

        for raw in generate_day(day, rng) {
            let click = recorder.enrich(&options.demo_code, &raw);
            batch.push(tx, click).await?;
        }

        if days % PROGRESS_EVERY_DAYS == 0 {
            info!(
                days,
                records = batch.inserted(),
                elapsed = ?started.elapsed(),
                "seed milestone"
            );
        }
    }

    batch.flush(tx).await.context("final batch insert failed")?;

    Ok(SeedReport {
        inserted: batch.inserted(),
        batches: batch.flushes(),
        days,
    })
}

/// Run a complete seed inside one transaction.
///
/// On any error the transaction is dropped uncommitted, which rolls back
/// every row written so far; the caller may simply run it again.
pub async fn seed(
    storage: &dyn Storage,
    options: &SeedOptions,
    recorder: &ClickRecorder,
    rng: &mut StdRng,
) -> Result<SeedReport> {
    info!(
        start = %options.range.start(),
        end = %options.range.end(),
        batch_size = options.batch_size,
        "seeding started"
    );

    let mut tx = storage
        .begin_seed()
        .await
        .context("failed to start seed transaction")?;
    info!("transaction started");

    let report = seed_into(tx.as_mut(), options, recorder, rng).await?;

    tx.commit().await.context("failed to commit seed transaction")?;
    info!(
        inserted = report.inserted,
        batches = report.batches,
        days = report.days,
        "seed transaction committed"
    );

    Ok(report)
}

use crate::models::{
    BrowserClicks, ClickEvent, CountryClicks, DailyClicks, NewClick, ReferrerClicks, ShortLink,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Version of the table layout written by `Storage::init`.
///
/// Version 1 stored clicks without browser or country columns; version 2 is
/// the superset layout.
pub const SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorageError {
    /// Classify a driver error, mapping unique-constraint violations to `Conflict`.
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        let is_unique = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if is_unique {
            StorageError::Conflict
        } else {
            StorageError::Other(err.into())
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub open_connections: u32,
    pub idle_connections: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, record the schema version)
    async fn init(&self) -> Result<()>;

    /// Insert a new link under `code`. Fails with `Conflict` if the code is taken.
    async fn create_with_code(&self, code: &str, destination: &str) -> StorageResult<ShortLink>;

    /// Get a link by short code
    async fn get(&self, code: &str) -> Result<Option<ShortLink>>;

    /// Point an existing link at a new destination. Returns false if the code is unknown.
    async fn update_destination(&self, code: &str, destination: &str) -> Result<bool>;

    /// Append one click
    async fn record_click(&self, click: &NewClick) -> Result<()>;

    /// Most recent clicks first
    async fn list_clicks(&self, code: &str, limit: i64) -> Result<Vec<ClickEvent>>;

    async fn clicks_per_day(&self, code: &str) -> Result<Vec<DailyClicks>>;

    async fn clicks_per_browser(&self, code: &str) -> Result<Vec<BrowserClicks>>;

    async fn clicks_per_referrer(&self, code: &str) -> Result<Vec<ReferrerClicks>>;

    async fn clicks_per_country(&self, code: &str) -> Result<Vec<CountryClicks>>;

    async fn link_count(&self) -> Result<i64>;

    async fn click_count(&self, code: &str) -> Result<i64>;

    /// Round-trip to the database and report pool statistics
    async fn health(&self) -> Result<StoreHealth>;

    /// Close the pool; waits for checked-out connections to be returned
    async fn close(&self);

    /// Open the single transaction used by the seed run
    async fn begin_seed(&self) -> Result<Box<dyn SeedTransaction>>;
}

/// Transaction scope for bulk seeding.
///
/// Dropping the value without calling `commit` rolls everything back.
#[async_trait]
pub trait SeedTransaction: Send {
    /// Insert the link unless the code already exists
    async fn ensure_link(&mut self, code: &str, destination: &str) -> Result<()>;

    /// Multi-row insert; returns the number of rows written
    async fn insert_clicks(&mut self, clicks: &[NewClick]) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

pub(crate) fn unix_now() -> Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}

/// Columns version 1 lacked on `clicks`, with the definitions used to add
/// them in place. Rows recorded before the upgrade get the defaults.
pub(crate) const V1_MISSING_CLICK_COLUMNS: [(&str, &str); 3] = [
    ("browser", "TEXT NOT NULL DEFAULT 'Other'"),
    ("country_name", "TEXT NOT NULL DEFAULT ''"),
    ("country_iso_code", "TEXT NOT NULL DEFAULT ''"),
];

/// Returns true when the stored layout is version 1 and must be upgraded.
///
/// Refuses databases written by a newer binary and versions that never existed.
pub(crate) fn check_schema_version(stored: Option<i64>) -> Result<bool> {
    match stored {
        None => Ok(false),
        Some(1) => Ok(true),
        Some(SCHEMA_VERSION) => Ok(false),
        Some(v) if v > SCHEMA_VERSION => anyhow::bail!(
            "database schema version {v} is newer than supported version {SCHEMA_VERSION}"
        ),
        Some(v) => anyhow::bail!("unknown database schema version {v}"),
    }
}

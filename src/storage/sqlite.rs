use crate::models::{
    BrowserClicks, ClickEvent, CountryClicks, DailyClicks, NewClick, ReferrerClicks, ShortLink,
};
use crate::storage::trait_def::{check_schema_version, unix_now, V1_MISSING_CLICK_COLUMNS};
use crate::storage::{
    SeedTransaction, Storage, StorageError, StorageResult, StoreHealth, SCHEMA_VERSION,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Add the click columns version 1 lacked, all or nothing
    async fn upgrade_from_v1(&self) -> Result<()> {
        tracing::info!("Upgrading database schema from version 1 to {}", SCHEMA_VERSION);
        let mut tx = self.pool.begin().await?;
        for (column, definition) in V1_MISSING_CLICK_COLUMNS {
            sqlx::query(&format!("ALTER TABLE clicks ADD COLUMN {column} {definition}"))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to add clicks.{column}"))?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        let stored =
            sqlx::query_scalar::<_, i64>("SELECT version FROM schema_version WHERE id = 1")
                .fetch_optional(self.pool.as_ref())
                .await?;
        if check_schema_version(stored)? {
            self.upgrade_from_v1().await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                destination TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link_code TEXT NOT NULL REFERENCES links(code),
                browser TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                referrer TEXT NOT NULL,
                country_name TEXT NOT NULL,
                country_iso_code TEXT NOT NULL,
                anonymized_ip TEXT NOT NULL,
                occurred_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_clicks_link_time ON clicks(link_code, occurred_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            INSERT INTO schema_version (id, version) VALUES (1, ?)
            ON CONFLICT (id) DO UPDATE SET version = excluded.version
            "#,
        )
        .bind(SCHEMA_VERSION)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_with_code(&self, code: &str, destination: &str) -> StorageResult<ShortLink> {
        let now = unix_now()?;

        sqlx::query_as::<_, ShortLink>(
            r#"
            INSERT INTO links (code, destination, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, code, destination, created_at, updated_at
            "#,
        )
        .bind(code)
        .bind(destination)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(StorageError::from_insert)
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, code, destination, created_at, updated_at
            FROM links
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn update_destination(&self, code: &str, destination: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET destination = ?, updated_at = ?
            WHERE code = ?
            "#,
        )
        .bind(destination)
        .bind(unix_now()?)
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_click(&self, click: &NewClick) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clicks (
                link_code, browser, user_agent, referrer,
                country_name, country_iso_code, anonymized_ip, occurred_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(click.link_code.as_str())
        .bind(click.browser.as_str())
        .bind(click.user_agent.as_str())
        .bind(click.referrer.as_str())
        .bind(click.country_name.as_str())
        .bind(click.country_iso_code.as_str())
        .bind(click.anonymized_ip.as_str())
        .bind(click.occurred_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list_clicks(&self, code: &str, limit: i64) -> Result<Vec<ClickEvent>> {
        let clicks = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, link_code, browser, user_agent, referrer,
                   country_name, country_iso_code, anonymized_ip, occurred_at
            FROM clicks
            WHERE link_code = ?
            ORDER BY occurred_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(code)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(clicks)
    }

    async fn clicks_per_day(&self, code: &str) -> Result<Vec<DailyClicks>> {
        let rows = sqlx::query_as::<_, DailyClicks>(
            r#"
            SELECT date(occurred_at, 'unixepoch') AS day, COUNT(*) AS click_count
            FROM clicks
            WHERE link_code = ?
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn clicks_per_browser(&self, code: &str) -> Result<Vec<BrowserClicks>> {
        let rows = sqlx::query_as::<_, BrowserClicks>(
            r#"
            SELECT browser, COUNT(*) AS click_count
            FROM clicks
            WHERE link_code = ?
            GROUP BY browser
            ORDER BY click_count DESC, browser ASC
            "#,
        )
        .bind(code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn clicks_per_referrer(&self, code: &str) -> Result<Vec<ReferrerClicks>> {
        let rows = sqlx::query_as::<_, ReferrerClicks>(
            r#"
            SELECT referrer, COUNT(*) AS click_count
            FROM clicks
            WHERE link_code = ?
            GROUP BY referrer
            ORDER BY click_count DESC, referrer ASC
            "#,
        )
        .bind(code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn clicks_per_country(&self, code: &str) -> Result<Vec<CountryClicks>> {
        let rows = sqlx::query_as::<_, CountryClicks>(
            r#"
            SELECT country_iso_code, country_name, COUNT(*) AS click_count
            FROM clicks
            WHERE link_code = ?
            GROUP BY country_iso_code, country_name
            ORDER BY click_count DESC, country_iso_code ASC, country_name ASC
            "#,
        )
        .bind(code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn link_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }

    async fn click_count(&self, code: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clicks WHERE link_code = ?")
            .bind(code)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }

    async fn health(&self) -> Result<StoreHealth> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;

        Ok(StoreHealth {
            open_connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn begin_seed(&self) -> Result<Box<dyn SeedTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteSeedTransaction { tx }))
    }
}

pub struct SqliteSeedTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl SeedTransaction for SqliteSeedTransaction {
    async fn ensure_link(&mut self, code: &str, destination: &str) -> Result<()> {
        let now = unix_now()?;

        sqlx::query(
            r#"
            INSERT INTO links (code, destination, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(destination)
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_clicks(&mut self, clicks: &[NewClick]) -> Result<u64> {
        if clicks.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO clicks (link_code, browser, user_agent, referrer, \
             country_name, country_iso_code, anonymized_ip, occurred_at) ",
        );
        builder.push_values(clicks, |mut row, click| {
            row.push_bind(click.link_code.clone())
                .push_bind(click.browser.clone())
                .push_bind(click.user_agent.clone())
                .push_bind(click.referrer.clone())
                .push_bind(click.country_name.clone())
                .push_bind(click.country_iso_code.clone())
                .push_bind(click.anonymized_ip.clone())
                .push_bind(click.occurred_at);
        });

        let result = builder.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let SqliteSeedTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

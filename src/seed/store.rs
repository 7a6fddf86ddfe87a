use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use super::summary::ImportSummary;
use crate::{
    db,
    foods::{repo, repo_types::NewFood},
};

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DatabaseInfo {
    pub name: String,
    /// `None` when the role may not connect to that database.
    pub size_bytes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub deleted: u64,
    pub inserted: u64,
}

/// Storage the seed operations run against.
#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;

    async fn list_databases(&self) -> anyhow::Result<Vec<DatabaseInfo>>;

    async fn delete_all(&self) -> anyhow::Result<u64>;

    /// Delete every food and insert `foods`; all or nothing.
    async fn replace_all(&self, foods: &[NewFood]) -> anyhow::Result<ReplaceOutcome>;

    async fn summary(&self, sample_size: i64) -> anyhow::Result<ImportSummary>;

    async fn close(&self);
}

pub struct PgFoodStore {
    pool: PgPool,
}

impl PgFoodStore {
    /// One-connection pool; fails once `timeout` elapses.
    pub async fn connect(database_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        info!(url = %db::redact_url(database_url), "connecting to database");
        let pool = db::connect(database_url, 1, timeout).await?;
        Ok(Self { pool })
    }

    /// Create or upgrade the schema; the utility may run before the server ever has.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        db::run_migrations(&self.pool).await?;
        info!("database schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FoodStore for PgFoodStore {
    async fn ping(&self) -> anyhow::Result<()> {
        db::ping(&self.pool).await
    }

    async fn list_databases(&self) -> anyhow::Result<Vec<DatabaseInfo>> {
        let rows = sqlx::query_as::<_, DatabaseInfo>(
            r#"
            SELECT datname AS name,
                   CASE WHEN has_database_privilege(datname, 'CONNECT')
                        THEN pg_database_size(datname)
                   END AS size_bytes
              FROM pg_database
             WHERE NOT datistemplate
             ORDER BY datname
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list databases")?;
        Ok(rows)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        repo::delete_all(&self.pool).await
    }

    async fn replace_all(&self, foods: &[NewFood]) -> anyhow::Result<ReplaceOutcome> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let deleted = repo::delete_all(&mut *tx).await?;
        info!(deleted, "cleared existing foods");

        let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM foods")
            .fetch_one(&mut *tx)
            .await
            .context("count foods after delete")?;
        debug!(remaining, "foods left before insert");

        let inserted = repo::insert_many(&mut tx, foods).await?;
        tx.commit().await.context("commit tx")?;
        info!(inserted, "inserted foods");

        Ok(ReplaceOutcome { deleted, inserted })
    }

    async fn summary(&self, sample_size: i64) -> anyhow::Result<ImportSummary> {
        Ok(ImportSummary {
            total: repo::count(&self.pool).await?,
            categories: repo::categories(&self.pool).await?,
            popular: repo::count_popular(&self.pool).await?,
            special_offers: repo::count_special_offers(&self.pool).await?,
            sample: repo::sample(&self.pool, sample_size).await?,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database connection closed");
    }
}

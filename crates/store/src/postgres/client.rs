//! Postgres connection pool wrapper.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use souq_config::StoreConfig;

use crate::error::Result;

/// Thin wrapper around a bounded `sqlx::PgPool` (spec §5 "Store
/// connection pool bounded, defaults min 5 / max 20").
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        tracing::info!(pool_min = config.pool_min, pool_max = config.pool_max, "connecting to store");

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Used by `health_check()` (spec §6): a trivial round trip.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

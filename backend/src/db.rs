//! Store handle
//!
//! The pool is created once at process start, handed to every service through
//! `AppState`, and closed after the server has drained.

use std::time::Duration;

use sqlx::{
    postgres::{PgPoolOptions, Postgres},
    Executor, PgPool, Transaction,
};

use crate::config::DatabaseConfig;

/// Shared handle to the relational store
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Open the bounded connection pool and verify connectivity
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = Self::pool_options(config).connect(&config.url).await?;
        Ok(Self { pool })
    }

    /// Build the pool without opening a connection until first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = Self::pool_options(config).connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start a transaction. Dropping it without `commit` rolls back and
    /// returns the connection to the pool.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Cheap connectivity probe for health checks
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl From<PgPool> for Store {
    fn from(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Whether a property row exists
pub async fn property_exists<'e, E>(executor: E, property_id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM properties WHERE id = $1)")
        .bind(property_id)
        .fetch_one(executor)
        .await
}

/// Whether a product row exists
pub async fn product_exists<'e, E>(executor: E, product_id: i32) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
        .bind(product_id)
        .fetch_one(executor)
        .await
}

//! Catalog database (SQLite via sqlx).
//!
//! Holds videos, their position/technique/guard categories and tags. The
//! schema lives in `migrations/` and is applied on connect.

mod categories;
mod tags;
pub mod types;
mod videos;

#[cfg(test)]
mod tests;

pub use types::*;
pub use videos::VideoFilter;

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

/// Handle to the catalog database
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect using the configured URL and run pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::open(&config.url, config.max_connections).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Fresh in-memory database with the schema applied
    pub async fn in_memory() -> Result<Self> {
        let db = Self::open("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    async fn open(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if is_memory_url(url) {
            // every pooled connection to :memory: would be a separate database
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        debug!("🗄️ Connected to {}", url);
        Ok(Self { pool })
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("🗄️ Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

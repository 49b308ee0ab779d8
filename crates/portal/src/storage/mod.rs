//! SQLite storage for the portal.
//!
//! All mutations of `classes.spots_taken` go through the conditional
//! reserve/release statements in `registrations.rs`; nothing else touches
//! the counter besides admin capacity edits.

mod accounts;
mod classes;
mod content;
mod registrations;
mod sponsorships;
mod students;

pub use classes::{CatalogFilter, CatalogKind};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use sprout_common::Result;
use tracing::info;

const SCHEMA: &str = include_str!("../schema.sql");

/// Storage backend, cheaply cloneable.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Connect to the database at `url`, creating the file if missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("Connected to database at {}", url);
        Ok(Self { pool })
    }

    /// An isolated in-memory database, used by tests.
    ///
    /// A single connection keeps every query on the same in-memory store.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    /// Apply the schema. Every statement is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

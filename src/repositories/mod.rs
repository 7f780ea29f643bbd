//! Repository implementations for database operations.
//!
//! These repositories provide async operations over a shared SQLite pool.
//! None of them keep state besides the pool handle.

pub mod association;
pub mod entry;
pub mod tag;

pub use association::*;
pub use entry::*;
pub use tag::*;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;

use crate::error::TagResult;

/// Database context containing all repositories.
#[derive(Clone)]
pub struct DbContext {
    pub pool: SqlitePool,
    pub tags: TagRepository,
    pub associations: AssociationRepository,
    pub entries: EntryRepository,
}

impl DbContext {
    /// Create a new database context from a connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tags: TagRepository::new(pool.clone()),
            associations: AssociationRepository::new(pool.clone()),
            entries: EntryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> TagResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Roll back explicitly so the connection goes back to the pool clean.
pub(crate) async fn rollback(tx: Transaction<'_, Sqlite>, entity: &'static str) {
    if let Err(e) = tx.rollback().await {
        warn!(entity, error = %e, "Rollback failed");
    }
}

//! Association repository - which of a user's tags an entry carries.

use std::collections::BTreeSet;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{TagError, TagResult};

const ENTITY: &str = "entry user tags";

/// Repository for the entry ↔ tag relation.
///
/// Associations are never inserted or deleted one by one: the set for an
/// entry is always replaced as a whole, or shrinks when a tag is deleted.
#[derive(Clone)]
pub struct AssociationRepository {
    pool: SqlitePool,
}

impl AssociationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// IDs of the user's tags assigned to an entry.
    pub async fn tag_ids_for_entry(&self, user_id: i64, entry_id: i64) -> TagResult<BTreeSet<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT eut.user_tag_id
            FROM entry_user_tags eut
            JOIN user_tags ut ON ut.id = eut.user_tag_id
            WHERE ut.user_id = ?1 AND eut.entry_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await
        .map_err(TagError::storage(ENTITY, "fetch"))?;

        Ok(ids.into_iter().collect())
    }

    /// Replace every tag of the user on an entry with `tag_ids`.
    ///
    /// IDs the user does not own are dropped without error and duplicates
    /// collapse. The clear and the inserts run in one transaction; any
    /// failure rolls the entry back to its previous tags. Returns the set
    /// that was applied.
    pub async fn replace_entry_tags(
        &self,
        user_id: i64,
        entry_id: i64,
        tag_ids: &[i64],
    ) -> TagResult<BTreeSet<i64>> {
        let requested: BTreeSet<i64> = tag_ids.iter().copied().collect();

        // Take the write lock up front: the ownership probe reads first, and
        // a deferred read lock cannot wait to be upgraded under WAL.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(TagError::storage(ENTITY, "begin update of"))?;

        match Self::replace_in_tx(&mut tx, user_id, entry_id, &requested).await {
            Ok(applied) => {
                tx.commit()
                    .await
                    .map_err(TagError::storage(ENTITY, "commit"))?;

                let dropped = requested.len() - applied.len();
                if dropped > 0 {
                    info!(user_id, entry_id, dropped, "Ignored tag IDs not owned by user");
                }
                debug!(user_id, entry_id, tags = applied.len(), "Replaced entry user tags");
                Ok(applied)
            }
            Err(e) => {
                super::rollback(tx, ENTITY).await;
                Err(e)
            }
        }
    }

    async fn replace_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        entry_id: i64,
        requested: &BTreeSet<i64>,
    ) -> TagResult<BTreeSet<i64>> {
        let owned_entry = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM entries WHERE id = ?1 AND user_id = ?2)",
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(TagError::storage("entry", "probe"))?;

        if owned_entry == 0 {
            return Err(TagError::NotFound);
        }

        // Only this user's tags are cleared; other owners' rows stay.
        sqlx::query(
            r#"
            DELETE FROM entry_user_tags
            WHERE entry_id = ?1
              AND user_tag_id IN (SELECT id FROM user_tags WHERE user_id = ?2)
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(TagError::storage(ENTITY, "clear"))?;

        let mut applied = BTreeSet::new();
        for &tag_id in requested {
            // Selecting through user_tags turns a foreign ID into a no-op insert.
            let result = sqlx::query(
                r#"
                INSERT INTO entry_user_tags (entry_id, user_tag_id)
                SELECT ?1, id FROM user_tags WHERE id = ?2 AND user_id = ?3
                "#,
            )
            .bind(entry_id)
            .bind(tag_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .map_err(TagError::storage(ENTITY, "insert"))?;

            if result.rows_affected() > 0 {
                applied.insert(tag_id);
            }
        }

        Ok(applied)
    }

    /// Delete every association of a tag within the caller's transaction.
    pub async fn delete_tag_cascade(conn: &mut SqliteConnection, tag_id: i64) -> TagResult<u64> {
        let result = sqlx::query("DELETE FROM entry_user_tags WHERE user_tag_id = ?1")
            .bind(tag_id)
            .execute(conn)
            .await
            .map_err(TagError::storage(ENTITY, "unlink"))?;

        Ok(result.rows_affected())
    }
}

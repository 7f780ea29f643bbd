//! Tag repository - identity, ownership and title uniqueness of user tags.

use sqlx::SqlitePool;
use tracing::debug;

use crate::entities::{title_key, UserTag};
use crate::error::{TagError, TagResult};
use crate::repositories::AssociationRepository;

const ENTITY: &str = "user tag";

/// Repository for user tag operations.
///
/// Every query is scoped by the owning user ID.
#[derive(Clone)]
pub struct TagRepository {
    pool: SqlitePool,
}

impl TagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a tag by ID. `None` when the user owns no such tag.
    pub async fn find_by_id(&self, user_id: i64, tag_id: i64) -> TagResult<Option<UserTag>> {
        sqlx::query_as::<_, UserTag>(
            "SELECT id, user_id, title FROM user_tags WHERE user_id = ?1 AND id = ?2",
        )
        .bind(user_id)
        .bind(tag_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(TagError::storage(ENTITY, "fetch"))
    }

    /// Get a tag by title, ignoring case.
    pub async fn find_by_title(&self, user_id: i64, title: &str) -> TagResult<Option<UserTag>> {
        sqlx::query_as::<_, UserTag>(
            "SELECT id, user_id, title FROM user_tags WHERE user_id = ?1 AND title_key = ?2",
        )
        .bind(user_id)
        .bind(title_key(title))
        .fetch_optional(&self.pool)
        .await
        .map_err(TagError::storage(ENTITY, "fetch"))
    }

    /// List the user's tags ordered by title, each with its live entry count.
    pub async fn find_all(&self, user_id: i64) -> TagResult<Vec<UserTag>> {
        sqlx::query_as::<_, UserTag>(
            r#"
            SELECT
                ut.id,
                ut.user_id,
                ut.title,
                (
                    SELECT count(*) FROM entry_user_tags eut WHERE eut.user_tag_id = ut.id
                ) AS entry_count
            FROM user_tags ut
            WHERE ut.user_id = ?1
            ORDER BY ut.title_key ASC, ut.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(TagError::storage(ENTITY, "list"))
    }

    /// Check whether the user owns a tag with this ID.
    pub async fn exists(&self, user_id: i64, tag_id: i64) -> TagResult<bool> {
        sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM user_tags WHERE user_id = ?1 AND id = ?2)",
        )
        .bind(user_id)
        .bind(tag_id)
        .fetch_one(&self.pool)
        .await
        .map(|found| found != 0)
        .map_err(TagError::storage(ENTITY, "probe"))
    }

    /// Check whether the user has a tag with this title, ignoring case.
    pub async fn title_exists(&self, user_id: i64, title: &str) -> TagResult<bool> {
        sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM user_tags WHERE user_id = ?1 AND title_key = ?2)",
        )
        .bind(user_id)
        .bind(title_key(title))
        .fetch_one(&self.pool)
        .await
        .map(|found| found != 0)
        .map_err(TagError::storage(ENTITY, "probe"))
    }

    /// Like [`Self::title_exists`] but ignores the tag being modified.
    pub async fn another_tag_with_title_exists(
        &self,
        user_id: i64,
        tag_id: i64,
        title: &str,
    ) -> TagResult<bool> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_tags
                WHERE user_id = ?1 AND id != ?2 AND title_key = ?3
            )
            "#,
        )
        .bind(user_id)
        .bind(tag_id)
        .bind(title_key(title))
        .fetch_one(&self.pool)
        .await
        .map(|found| found != 0)
        .map_err(TagError::storage(ENTITY, "probe"))
    }

    /// Create a new tag.
    ///
    /// Duplicate titles are rejected by the unique index and reported as
    /// `Conflict`, whatever validation ran before.
    pub async fn create(&self, user_id: i64, title: &str) -> TagResult<UserTag> {
        let created = sqlx::query_as::<_, UserTag>(
            r#"
            INSERT INTO user_tags (user_id, title, title_key)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, title
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(title_key(title))
        .fetch_one(&self.pool)
        .await
        .map_err(TagError::write(ENTITY, "create"))?;

        debug!(user_id, tag_id = created.id, "Created user tag");
        Ok(created)
    }

    /// Persist the title of an existing tag.
    pub async fn update(&self, tag: &UserTag) -> TagResult<()> {
        let result = sqlx::query(
            "UPDATE user_tags SET title = ?1, title_key = ?2 WHERE id = ?3 AND user_id = ?4",
        )
        .bind(&tag.title)
        .bind(title_key(&tag.title))
        .bind(tag.id)
        .bind(tag.user_id)
        .execute(&self.pool)
        .await
        .map_err(TagError::write(ENTITY, "update"))?;

        if result.rows_affected() == 0 {
            return Err(TagError::NotFound);
        }

        debug!(user_id = tag.user_id, tag_id = tag.id, "Renamed user tag");
        Ok(())
    }

    /// Delete a tag together with all of its entry associations.
    ///
    /// Returns `NotFound` when the user owns no such tag.
    pub async fn delete(&self, user_id: i64, tag_id: i64) -> TagResult<()> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(TagError::storage(ENTITY, "begin removal of"))?;

        // Associations go first; a foreign or missing tag rolls them back.
        let outcome: TagResult<u64> = async {
            let unlinked = AssociationRepository::delete_tag_cascade(&mut *tx, tag_id).await?;

            let result = sqlx::query("DELETE FROM user_tags WHERE id = ?1 AND user_id = ?2")
                .bind(tag_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(TagError::storage(ENTITY, "remove"))?;

            if result.rows_affected() == 0 {
                return Err(TagError::NotFound);
            }

            Ok(unlinked)
        }
        .await;

        match outcome {
            Ok(unlinked) => {
                tx.commit()
                    .await
                    .map_err(TagError::storage(ENTITY, "commit removal of"))?;
                debug!(user_id, tag_id, unlinked, "Removed user tag");
                Ok(())
            }
            Err(e) => {
                super::rollback(tx, ENTITY).await;
                Err(e)
            }
        }
    }
}

//! Tag service - the operation set offered to transports.
//!
//! Each call takes the authenticated user ID first; nothing here can reach
//! a row of another user.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::entities::{
    Entry, EntryFilters, EntryStatus, UserTag, UserTagCreationRequest,
    UserTagModificationRequest,
};
use crate::error::{TagError, TagResult};
use crate::query::UserTagFilter;
use crate::repositories::DbContext;
use crate::validator::{validate_user_tag_creation, validate_user_tag_modification};

/// Tag lifecycle, bulk assignment and tagged entry listing.
#[derive(Clone)]
pub struct TagService {
    db: DbContext,
}

impl TagService {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Underlying repositories.
    pub fn db(&self) -> &DbContext {
        &self.db
    }

    /// All tags of the user with entry counts, ordered by title.
    pub async fn list_tags(&self, user_id: i64) -> TagResult<Vec<UserTag>> {
        self.db.tags.find_all(user_id).await
    }

    /// A single tag, `NotFound` if the user owns none with this ID.
    pub async fn get_tag(&self, user_id: i64, tag_id: i64) -> TagResult<UserTag> {
        self.db
            .tags
            .find_by_id(user_id, tag_id)
            .await?
            .ok_or(TagError::NotFound)
    }

    pub async fn tag_exists(&self, user_id: i64, tag_id: i64) -> TagResult<bool> {
        self.db.tags.exists(user_id, tag_id).await
    }

    /// Validate and create a tag.
    pub async fn create_tag(
        &self,
        user_id: i64,
        request: &UserTagCreationRequest,
    ) -> TagResult<UserTag> {
        validate_user_tag_creation(&self.db.tags, user_id, request).await?;

        let tag = self
            .db
            .tags
            .create(user_id, &request.title)
            .await
            .inspect_err(|e| {
                if e.is_conflict() {
                    warn!(user_id, "Concurrent creation of the same tag title");
                }
            })?;

        info!(user_id, tag_id = tag.id, "User tag created");
        Ok(tag)
    }

    /// Validate and apply a modification. An absent title leaves the tag
    /// unchanged and still returns it.
    pub async fn rename_tag(
        &self,
        user_id: i64,
        tag_id: i64,
        request: &UserTagModificationRequest,
    ) -> TagResult<UserTag> {
        let mut tag = self.get_tag(user_id, tag_id).await?;

        validate_user_tag_modification(&self.db.tags, user_id, tag.id, request).await?;

        if request.title.is_none() {
            return Ok(tag);
        }

        request.patch(&mut tag);
        self.db.tags.update(&tag).await?;

        info!(user_id, tag_id, "User tag renamed");
        Ok(tag)
    }

    /// Delete a tag and every association it had.
    pub async fn delete_tag(&self, user_id: i64, tag_id: i64) -> TagResult<()> {
        self.db.tags.delete(user_id, tag_id).await?;
        info!(user_id, tag_id, "User tag removed");
        Ok(())
    }

    /// IDs of the user's tags on an entry.
    pub async fn entry_tag_ids(&self, user_id: i64, entry_id: i64) -> TagResult<BTreeSet<i64>> {
        self.db.associations.tag_ids_for_entry(user_id, entry_id).await
    }

    /// Replace the user's tags on an entry. Unknown or foreign IDs are
    /// ignored; an empty list clears the entry.
    pub async fn set_entry_tags(
        &self,
        user_id: i64,
        entry_id: i64,
        tag_ids: &[i64],
    ) -> TagResult<BTreeSet<i64>> {
        self.db
            .associations
            .replace_entry_tags(user_id, entry_id, tag_ids)
            .await
    }

    /// Page of non-removed entries carrying the tag, plus the total count.
    pub async fn list_entries_by_tag(
        &self,
        user_id: i64,
        tag_id: i64,
        filters: &EntryFilters,
    ) -> TagResult<(Vec<Entry>, i64)> {
        filters.validate_range()?;

        if !self.tag_exists(user_id, tag_id).await? {
            return Err(TagError::NotFound);
        }

        let builder = self
            .db
            .entries
            .query(user_id)
            .with_filter(UserTagFilter::new(user_id, tag_id))
            .without_status(EntryStatus::Removed)
            .with_filters(filters);

        let entries = builder.get_entries().await?;
        let total = builder.count_entries().await?;
        Ok((entries, total))
    }
}

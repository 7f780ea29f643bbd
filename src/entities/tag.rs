//! User tag entity and the requests that create or modify one.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A label owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserTag {
    /// Primary key, never reused.
    pub id: i64,

    /// Owning user, fixed at creation.
    pub user_id: i64,

    /// Display title, unique per user ignoring case.
    pub title: String,

    /// Number of entries carrying the tag. Only filled by listings.
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<i64>,
}

impl fmt::Display for UserTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID={}, UserID={}, Title={}", self.id, self.user_id, self.title)
    }
}

/// Key used for case-insensitive title comparison and the unique index.
pub fn title_key(title: &str) -> String {
    title.to_lowercase()
}

/// Request body for creating a tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserTagCreationRequest {
    #[serde(default)]
    pub title: String,
}

/// Request body for modifying a tag.
///
/// `title: None` means the field was not sent and nothing changes; an empty
/// string is a real value and fails validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserTagModificationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

impl UserTagModificationRequest {
    /// Apply the provided fields to `tag`.
    pub fn patch(&self, tag: &mut UserTag) {
        if let Some(title) = &self.title {
            tag.title = title.clone();
        }
    }
}

//! Entry rows as seen by the tag engine.
//!
//! Entries belong to the feed collaborator. Only the columns needed to
//! filter, sort and display tagged listings are mapped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::error::ValidationError;

/// A content item that can carry tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub status: String,
    pub published_at: DateTime<Utc>,
}

/// Insert parameters for creating an entry.
#[derive(Debug, Clone)]
pub struct InsertEntry {
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub status: EntryStatus,
    pub published_at: DateTime<Utc>,
}

impl InsertEntry {
    /// Unread entry published now.
    pub fn new(user_id: i64, title: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            url: String::new(),
            status: EntryStatus::Unread,
            published_at: Utc::now(),
        }
    }
}

/// Reading state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Unread,
    Read,
    Removed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Removed => "removed",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            "removed" => Ok(Self::Removed),
            other => Err(ValidationError::InvalidEntryStatus(other.to_string())),
        }
    }
}

/// Columns an entry listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Id,
    Status,
    #[default]
    PublishedAt,
    Title,
}

impl SortColumn {
    /// Qualified column name, safe to splice into SQL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Id => "e.id",
            Self::Status => "e.status",
            Self::PublishedAt => "e.published_at",
            Self::Title => "e.title",
        }
    }
}

impl FromStr for SortColumn {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "status" => Ok(Self::Status),
            "published_at" => Ok(Self::PublishedAt),
            "title" => Ok(Self::Title),
            other => Err(ValidationError::InvalidEntryOrder(other.to_string())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ValidationError::InvalidDirection(other.to_string())),
        }
    }
}

/// Filters accepted when listing the entries of a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFilters {
    /// Only these statuses; empty means any status except removed.
    pub statuses: Vec<EntryStatus>,
    pub order: SortColumn,
    pub direction: SortDirection,
    pub limit: i64,
    pub offset: i64,
}

impl Default for EntryFilters {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            order: SortColumn::default(),
            direction: SortDirection::default(),
            limit: 100,
            offset: 0,
        }
    }
}

impl EntryFilters {
    /// Reject negative pagination values.
    pub fn validate_range(&self) -> Result<(), ValidationError> {
        if self.offset < 0 || self.limit < 0 {
            return Err(ValidationError::InvalidRange);
        }
        Ok(())
    }
}

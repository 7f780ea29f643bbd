//! Error types for the tag engine.

use thiserror::Error;

/// Why a tag request was rejected before touching the store.
///
/// Each variant carries a stable reason code that the UI layer translates
/// into a localized message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title was provided but empty.
    #[error("tag title is required")]
    TitleRequired,

    /// Another tag of the same user already uses this title.
    #[error("a tag with this title already exists")]
    AlreadyExists,

    /// Unknown entry status in a listing filter.
    #[error("invalid entry status: {0}")]
    InvalidEntryStatus(String),

    /// Unknown sort column in a listing request.
    #[error("invalid entry order: {0}")]
    InvalidEntryOrder(String),

    /// Sort direction other than `asc` or `desc`.
    #[error("invalid sort direction: {0}")]
    InvalidDirection(String),

    /// Negative offset or limit.
    #[error("offset and limit must be positive")]
    InvalidRange,
}

impl ValidationError {
    /// Machine-readable reason code used as the localization key.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TitleRequired => "error.tag_title_required",
            Self::AlreadyExists => "error.tag_already_exists",
            Self::InvalidEntryStatus(_) => "error.invalid_entry_status",
            Self::InvalidEntryOrder(_) => "error.invalid_entry_order",
            Self::InvalidDirection(_) => "error.invalid_direction",
            Self::InvalidRange => "error.invalid_range",
        }
    }
}

/// Tag engine errors.
#[derive(Error, Debug)]
pub enum TagError {
    /// Entity absent for the requesting user. Foreign rows look the same as
    /// missing ones.
    #[error("Entity not found")]
    NotFound,

    /// Request rejected by validation.
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Uniqueness violation raised by the store itself.
    #[error("{entity} conflicts with an existing record")]
    Conflict { entity: &'static str },

    /// Unexpected store failure. The display text never includes the raw
    /// driver message; it is kept as the source for logging.
    #[error("store: unable to {operation} {entity}")]
    Storage {
        entity: &'static str,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Schema migration failure.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl TagError {
    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Check if this is a store-level uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Reason code of a validation failure, if this is one.
    pub fn validation_code(&self) -> Option<&'static str> {
        match self {
            Self::ValidationFailed(reason) => Some(reason.code()),
            _ => None,
        }
    }

    /// Builds a `map_err` adapter wrapping a driver error with its context.
    pub(crate) fn storage(
        entity: &'static str,
        operation: &'static str,
    ) -> impl FnOnce(sqlx::Error) -> TagError {
        move |source| TagError::Storage {
            entity,
            operation,
            source,
        }
    }

    /// Like [`TagError::storage`], but maps constraint violations raised by
    /// a write to `Conflict` (unique index) or `TitleRequired` (check).
    pub(crate) fn write(
        entity: &'static str,
        operation: &'static str,
    ) -> impl FnOnce(sqlx::Error) -> TagError {
        move |source| {
            if let sqlx::Error::Database(db_err) = &source {
                if db_err.is_unique_violation() {
                    return TagError::Conflict { entity };
                }
                if db_err.is_check_violation() {
                    return TagError::ValidationFailed(ValidationError::TitleRequired);
                }
            }
            TagError::Storage {
                entity,
                operation,
                source,
            }
        }
    }
}

/// Result type for tag engine operations.
pub type TagResult<T> = Result<T, TagError>;

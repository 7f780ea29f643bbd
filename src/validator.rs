//! Request validation for user tags.
//!
//! Validation only reads through [`TitleIndex`]; it never mutates. It gives
//! friendly errors up front, while the unique index stays the real guard.

use async_trait::async_trait;

use crate::entities::{UserTagCreationRequest, UserTagModificationRequest};
use crate::error::{TagResult, ValidationError};
use crate::repositories::TagRepository;

/// Title existence probes, case-insensitive.
#[async_trait]
pub trait TitleIndex: Send + Sync {
    async fn title_exists(&self, user_id: i64, title: &str) -> TagResult<bool>;

    async fn another_tag_with_title_exists(
        &self,
        user_id: i64,
        tag_id: i64,
        title: &str,
    ) -> TagResult<bool>;
}

#[async_trait]
impl TitleIndex for TagRepository {
    async fn title_exists(&self, user_id: i64, title: &str) -> TagResult<bool> {
        TagRepository::title_exists(self, user_id, title).await
    }

    async fn another_tag_with_title_exists(
        &self,
        user_id: i64,
        tag_id: i64,
        title: &str,
    ) -> TagResult<bool> {
        TagRepository::another_tag_with_title_exists(self, user_id, tag_id, title).await
    }
}

/// Validate a tag creation request.
pub async fn validate_user_tag_creation(
    index: &dyn TitleIndex,
    user_id: i64,
    request: &UserTagCreationRequest,
) -> TagResult<()> {
    if request.title.is_empty() {
        return Err(ValidationError::TitleRequired.into());
    }

    if index.title_exists(user_id, &request.title).await? {
        return Err(ValidationError::AlreadyExists.into());
    }

    Ok(())
}

/// Validate a tag modification request. An absent title passes untouched.
pub async fn validate_user_tag_modification(
    index: &dyn TitleIndex,
    user_id: i64,
    tag_id: i64,
    request: &UserTagModificationRequest,
) -> TagResult<()> {
    let Some(title) = &request.title else {
        return Ok(());
    };

    if title.is_empty() {
        return Err(ValidationError::TitleRequired.into());
    }

    if index
        .another_tag_with_title_exists(user_id, tag_id, title)
        .await?
    {
        return Err(ValidationError::AlreadyExists.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::title_key;
    use crate::error::TagError;

    /// In-memory index: (user_id, tag_id, title).
    struct FakeIndex(Vec<(i64, i64, &'static str)>);

    #[async_trait]
    impl TitleIndex for FakeIndex {
        async fn title_exists(&self, user_id: i64, title: &str) -> TagResult<bool> {
            Ok(self
                .0
                .iter()
                .any(|(u, _, t)| *u == user_id && title_key(t) == title_key(title)))
        }

        async fn another_tag_with_title_exists(
            &self,
            user_id: i64,
            tag_id: i64,
            title: &str,
        ) -> TagResult<bool> {
            Ok(self.0.iter().any(|(u, id, t)| {
                *u == user_id && *id != tag_id && title_key(t) == title_key(title)
            }))
        }
    }

    /// Fails every probe, to check that validation short-circuits.
    struct BrokenIndex;

    #[async_trait]
    impl TitleIndex for BrokenIndex {
        async fn title_exists(&self, _: i64, _: &str) -> TagResult<bool> {
            Err(TagError::storage("user tag", "probe")(sqlx::Error::PoolClosed))
        }

        async fn another_tag_with_title_exists(&self, _: i64, _: i64, _: &str) -> TagResult<bool> {
            Err(TagError::storage("user tag", "probe")(sqlx::Error::PoolClosed))
        }
    }

    /// `None` when valid, the reason otherwise; store errors panic.
    fn reason_of(result: TagResult<()>) -> Option<ValidationError> {
        match result {
            Ok(()) => None,
            Err(TagError::ValidationFailed(reason)) => Some(reason),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    fn create(title: &str) -> UserTagCreationRequest {
        UserTagCreationRequest {
            title: title.to_string(),
        }
    }

    fn modify(title: Option<&str>) -> UserTagModificationRequest {
        UserTagModificationRequest {
            title: title.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_creation_with_empty_title() {
        let verdict = reason_of(validate_user_tag_creation(&BrokenIndex, 1, &create("")).await);
        assert_eq!(verdict, Some(ValidationError::TitleRequired));
    }

    #[tokio::test]
    async fn test_creation_does_not_trim() {
        let index = FakeIndex(vec![]);
        let verdict = reason_of(validate_user_tag_creation(&index, 1, &create("  ")).await);
        assert_eq!(verdict, None);
    }

    #[tokio::test]
    async fn test_creation_duplicate_ignores_case() {
        let index = FakeIndex(vec![(1, 1, "Go")]);
        let verdict = reason_of(validate_user_tag_creation(&index, 1, &create("go")).await);
        assert_eq!(verdict, Some(ValidationError::AlreadyExists));

        // Another user's namespace is independent.
        let verdict = reason_of(validate_user_tag_creation(&index, 2, &create("go")).await);
        assert_eq!(verdict, None);
    }

    #[tokio::test]
    async fn test_creation_propagates_store_failure() {
        let err = validate_user_tag_creation(&BrokenIndex, 1, &create("go"))
            .await
            .unwrap_err();
        assert!(matches!(err, TagError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_modification_with_absent_title() {
        let verdict =
            reason_of(validate_user_tag_modification(&BrokenIndex, 1, 1, &modify(None)).await);
        assert_eq!(verdict, None);
    }

    #[tokio::test]
    async fn test_modification_with_empty_title() {
        let result = validate_user_tag_modification(&BrokenIndex, 1, 1, &modify(Some(""))).await;
        let verdict = reason_of(result);
        assert_eq!(verdict, Some(ValidationError::TitleRequired));
    }

    #[tokio::test]
    async fn test_modification_to_own_title() {
        let index = FakeIndex(vec![(1, 1, "golang"), (1, 2, "devops")]);
        let result = validate_user_tag_modification(&index, 1, 1, &modify(Some("GoLang"))).await;
        let verdict = reason_of(result);
        assert_eq!(verdict, None);

        let result = validate_user_tag_modification(&index, 1, 1, &modify(Some("DevOps"))).await;
        let verdict = reason_of(result);
        assert_eq!(verdict, Some(ValidationError::AlreadyExists));
    }
}

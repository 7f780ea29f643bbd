//! HTTP request handlers for the user tag API
//!
//! - GET/POST /v1/user-tags
//! - PUT/DELETE /v1/user-tags/:id
//! - GET /v1/user-tags/:id/entries
//! - GET/PUT /v1/entries/:id/user-tags
//!
//! Authentication happens upstream; the user ID arrives in `X-User-Id`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::config::AppState;
use crate::entities::{
    Entry, EntryFilters, EntryStatus, UserTagCreationRequest, UserTagModificationRequest,
};
use crate::error::{TagError, ValidationError};

/// Header carrying the authenticated user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/user-tags", get(list_tags_handler).post(create_tag_handler))
        .route(
            "/v1/user-tags/:id",
            get(get_tag_handler)
                .put(update_tag_handler)
                .delete(delete_tag_handler),
        )
        .route("/v1/user-tags/:id/entries", get(tag_entries_handler))
        .route(
            "/v1/entries/:id/user-tags",
            get(entry_tags_handler).put(set_entry_tags_handler),
        )
        .route("/healthz", get(health_handler))
        .with_state(state)
}

// ═══════════════════════════════════════════════════════════════════════════
// Identity and errors
// ═══════════════════════════════════════════════════════════════════════════

/// The user the request acts for.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(AuthenticatedUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error_message": "Access Unauthorized"})),
                )
                    .into_response()
            })
    }
}

impl IntoResponse for TagError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TagError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
            TagError::ValidationFailed(reason) => (StatusCode::BAD_REQUEST, reason.code()),
            TagError::Conflict { .. } => (StatusCode::CONFLICT, "error.tag_already_exists"),
            TagError::Storage { .. } | TagError::Migration(_) => {
                error!(error = ?self, "Request failed on storage");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({"error_message": message}))).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tags
// ═══════════════════════════════════════════════════════════════════════════

/// GET /v1/user-tags
pub async fn list_tags_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<impl IntoResponse, TagError> {
    let tags = state.tags.list_tags(user_id).await?;
    Ok(Json(tags))
}

/// POST /v1/user-tags
pub async fn create_tag_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<UserTagCreationRequest>,
) -> Result<impl IntoResponse, TagError> {
    let tag = state.tags.create_tag(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /v1/user-tags/:id
pub async fn get_tag_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(tag_id): Path<i64>,
) -> Result<impl IntoResponse, TagError> {
    let tag = state.tags.get_tag(user_id, tag_id).await?;
    Ok(Json(tag))
}

/// PUT /v1/user-tags/:id
pub async fn update_tag_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(tag_id): Path<i64>,
    Json(request): Json<UserTagModificationRequest>,
) -> Result<impl IntoResponse, TagError> {
    let tag = state.tags.rename_tag(user_id, tag_id, &request).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// DELETE /v1/user-tags/:id
pub async fn delete_tag_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(tag_id): Path<i64>,
) -> Result<impl IntoResponse, TagError> {
    state.tags.delete_tag(user_id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ═══════════════════════════════════════════════════════════════════════════
// Tagged entries
// ═══════════════════════════════════════════════════════════════════════════

/// Query string of the tagged entry listing.
#[derive(Debug, Default, Deserialize)]
pub struct EntryListParams {
    /// Comma separated statuses.
    pub status: Option<String>,
    pub order: Option<String>,
    pub direction: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl EntryListParams {
    /// Parse into filters, rejecting unknown values.
    pub fn into_filters(self) -> Result<EntryFilters, ValidationError> {
        let mut filters = EntryFilters::default();

        if let Some(statuses) = self.status {
            filters.statuses = statuses
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<EntryStatus>)
                .collect::<Result<_, _>>()?;
        }
        if let Some(order) = self.order {
            filters.order = order.parse()?;
        }
        if let Some(direction) = self.direction {
            filters.direction = direction.parse()?;
        }
        if let Some(limit) = self.limit {
            filters.limit = limit;
        }
        if let Some(offset) = self.offset {
            filters.offset = offset;
        }

        filters.validate_range()?;
        Ok(filters)
    }
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub total: i64,
    pub entries: Vec<Entry>,
}

/// GET /v1/user-tags/:id/entries
pub async fn tag_entries_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(tag_id): Path<i64>,
    Query(params): Query<EntryListParams>,
) -> Result<impl IntoResponse, TagError> {
    let filters = params.into_filters()?;
    let (entries, total) = state
        .tags
        .list_entries_by_tag(user_id, tag_id, &filters)
        .await?;
    Ok(Json(EntriesResponse { total, entries }))
}

/// Body of PUT /v1/entries/:id/user-tags. A missing list clears the entry.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EntryTagsRequest {
    #[serde(default)]
    pub user_tag_ids: Option<Vec<i64>>,
}

/// GET /v1/entries/:id/user-tags
pub async fn entry_tags_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(entry_id): Path<i64>,
) -> Result<impl IntoResponse, TagError> {
    let ids = state.tags.entry_tag_ids(user_id, entry_id).await?;
    Ok(Json(json!({"user_tag_ids": ids})))
}

/// PUT /v1/entries/:id/user-tags
pub async fn set_entry_tags_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(entry_id): Path<i64>,
    Json(request): Json<EntryTagsRequest>,
) -> Result<impl IntoResponse, TagError> {
    let tag_ids = request.user_tag_ids.unwrap_or_default();
    state
        .tags
        .set_entry_tags(user_id, entry_id, &tag_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /healthz
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

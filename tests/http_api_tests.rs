//! Tests for the JSON API
//!
//! Requests go through the full router with `oneshot`; the store is an
//! in-memory SQLite database.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use user_tags::entities::InsertEntry;
use user_tags::handlers::router;
use user_tags::{connect_in_memory, AppState, DbContext};

async fn app() -> (Router, DbContext) {
    let db = connect_in_memory().await.unwrap();
    (router(AppState::new(db.clone())), db)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("X-User-Id", user.to_string());
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str, user: i64) -> (StatusCode, Value) {
    call(app, Method::GET, uri, Some(user), None).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: i64,
    body: Value,
) -> (StatusCode, Value) {
    call(app, method, uri, Some(user), Some(body)).await
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app().await;
    let (status, body) = call(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_user_is_unauthorized() {
    let (app, _) = app().await;
    let (status, _) = call(&app, Method::GET, "/v1/user-tags", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/user-tags")
        .header("X-User-Id", "abc")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tag_lifecycle() {
    let (app, _) = app().await;

    let (status, created) =
        send(&app, Method::POST, "/v1/user-tags", 1, json!({"title": "golang"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "golang");
    assert_eq!(created["user_id"], 1);
    let id = created["id"].as_i64().unwrap();

    let (status, body) =
        send(&app, Method::POST, "/v1/user-tags", 1, json!({"title": "GOLANG"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_message"], "error.tag_already_exists");

    let (status, body) = send(&app, Method::POST, "/v1/user-tags", 1, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_message"], "error.tag_title_required");

    let uri = format!("/v1/user-tags/{id}");
    let (status, renamed) = send(&app, Method::PUT, &uri, 1, json!({"title": "Go"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(renamed["title"], "Go");

    let (status, _) = send(&app, Method::PUT, &uri, 2, json!({"title": "mine"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = get(&app, "/v1/user-tags", 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        listed,
        json!([{"id": id, "user_id": 1, "title": "Go", "entry_count": 0}])
    );

    let (status, _) = call(&app, Method::DELETE, &uri, Some(1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::DELETE, &uri, Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entry_tags_and_listing() {
    let (app, db) = app().await;
    let entry = db
        .entries
        .create(&InsertEntry::new(1, "release notes"))
        .await
        .unwrap();

    let (_, a) = send(&app, Method::POST, "/v1/user-tags", 1, json!({"title": "a"})).await;
    let (_, b) = send(&app, Method::POST, "/v1/user-tags", 1, json!({"title": "b"})).await;
    let (a, b) = (a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap());

    let uri = format!("/v1/entries/{}/user-tags", entry.id);
    let (status, _) = send(&app, Method::PUT, &uri, 1, json!({"user_tag_ids": [b, a, 999]})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = get(&app, &uri, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"user_tag_ids": [a, b]}));

    let listing = format!("/v1/user-tags/{a}/entries?status=unread&order=title&direction=asc");
    let (status, body) = get(&app, &listing, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["entries"][0]["title"], "release notes");

    let (status, body) = get(&app, &format!("/v1/user-tags/{a}/entries?order=color"), 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_message"], "error.invalid_entry_order");

    let (status, _) = get(&app, &format!("/v1/user-tags/{a}/entries"), 2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A body without the list clears the entry.
    let (status, _) = send(&app, Method::PUT, &uri, 1, json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = get(&app, &uri, 1).await;
    assert_eq!(body, json!({"user_tag_ids": []}));

    let (status, _) = send(&app, Method::PUT, &uri, 2, json!({"user_tag_ids": [a]})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

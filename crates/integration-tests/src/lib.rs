//! Harness for end-to-end HTTP tests: the full router over a fresh
//! `MemoryStore`, real argon2 hashing and real JWTs.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_adapters::{router, AppState};
use auth_adapters::{Argon2Hasher, JwtTokenService};
use domains::{CommentId, CommentRepository, CommentStatus, NewComment, PostId, UserId};
use services::Repositories;
use storage_adapters::MemoryStore;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "password123";

/// A registered user and the token they can act with.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub token: String,
}

pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories {
            users: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
        };
        let state = AppState::new(
            repos,
            Arc::new(Argon2Hasher::new()),
            Arc::new(JwtTokenService::new(TEST_SECRET, Duration::minutes(60))),
        );
        Self {
            router: router(state),
            store,
        }
    }

    /// Send one request; the body is parsed as JSON when it is JSON.
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.raw(builder.body(body).unwrap()).await
    }

    pub async fn raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    pub async fn register(&self, name: &str, email: &str) -> Account {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Account {
            id: body["user"]["id"].as_i64().unwrap(),
            token: body["token"].as_str().unwrap().to_owned(),
        }
    }

    /// Create a post through the API and return its id.
    pub async fn create_post(&self, owner: &Account, title: &str, status: &str) -> i64 {
        let (code, body) = self
            .post(
                "/api/posts",
                Some(&owner.token),
                json!({ "title": title, "content": "Test content", "status": status }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    /// Comment through the API (always lands as pending) and return its id.
    pub async fn create_comment(&self, author: &Account, post_id: i64) -> i64 {
        let (code, body) = self
            .post(
                &format!("/api/comments/{post_id}"),
                Some(&author.token),
                json!({ "content": "Test comment content" }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    /// Moderation has no endpoint; tests place comments in any status
    /// directly through the store.
    pub async fn seed_comment(&self, author: &Account, post_id: i64, parent_id: Option<i64>, status: CommentStatus) -> i64 {
        let comment = CommentRepository::insert(
            self.store.as_ref(),
            NewComment {
                content: "Seeded comment".into(),
                status,
                user_id: UserId(author.id),
                post_id: PostId(post_id),
                parent_id: parent_id.map(CommentId),
            },
        )
        .await
        .unwrap();
        comment.id.0
    }
}

/// Ids of a list response's `data`, in order.
pub fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
        .unwrap_or_default()
}

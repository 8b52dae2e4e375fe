use axum::http::StatusCode;
use serde_json::json;

use integration_tests::{TestApp, PASSWORD};

#[tokio::test]
async fn register_returns_user_and_token() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Test User", "email": "Test@Example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["name"], "Test User");
    assert_eq!(body["user"]["email"], "test@example.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "short" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"]["name"][0], "name is required");
    assert_eq!(body["errors"]["email"][0], "email must be a valid email address");
    assert_eq!(body["errors"]["password"][0], "password must be at least 8 characters");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new();
    app.register("First", "test@example.com").await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Second", "email": "test@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "email has already been taken");
}

#[tokio::test]
async fn login_checks_the_password() {
    let app = TestApp::new();
    app.register("Test User", "test@example.com").await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "test@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid email or password");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "TEST@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "test@example.com");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = TestApp::new();
    let account = app.register("Test User", "test@example.com").await;

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.get("/api/auth/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/auth/me", Some(&account.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], account.id);
}

#[tokio::test]
async fn logout_revokes_only_the_presented_token() {
    let app = TestApp::new();
    let account = app.register("Test User", "test@example.com").await;
    let (_, login) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "test@example.com", "password": PASSWORD }),
        )
        .await;
    let second = login["token"].as_str().unwrap().to_owned();

    let (status, _) = app.post("/api/auth/logout", Some(&account.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/auth/me", Some(&account.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/auth/me", Some(&second)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = TestApp::new();
    let (status, _) = app.get("/up", None).await;
    assert_eq!(status, StatusCode::OK);

    app.get("/api/posts", None).await;
    let (status, body) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains(r#"path="/api/posts""#));
}

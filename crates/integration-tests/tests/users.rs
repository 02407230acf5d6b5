//! Integration tests for registration, login and profiles.

use reqwest::StatusCode;
use serde_json::json;

use restcrud_integration_tests::{PASSWORD, TestApp, body};

#[tokio::test]
async fn test_register_never_returns_password() {
    let app = TestApp::spawn().await;

    let resp = TestApp::client()
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": "alice", "email": "alice@example.com", "password": PASSWORD }))
        .send()
        .await
        .expect("register");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = body(resp).await;
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let app = TestApp::spawn().await;
    app.login_as("alice").await;

    let resp = TestApp::client()
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": "alice", "email": "other@example.com", "password": PASSWORD }))
        .send()
        .await
        .expect("register");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(body(resp).await.get("username").is_some());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.login_as("alice").await;

    let resp = TestApp::client()
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": "alice", "password": "not the password" }))
        .send()
        .await
        .expect("login");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_is_own_user_only() {
    let app = TestApp::spawn().await;
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;

    let me = body(alice.get(app.url("/api/users/me")).send().await.expect("me")).await;
    assert_eq!(me["username"], "alice");

    let resp = alice.get(app.url("/api/users")).send().await.expect("list");
    assert_eq!(body(resp).await, json!([me]));

    let url = app.url(&format!("/api/users/{}", me["id"]));
    let resp = alice.get(&url).send().await.expect("own");
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = bob.get(&url).send().await.expect("other");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    let alice = app.login_as("alice").await;

    let resp = alice.post(app.url("/api/auth/logout")).send().await.expect("logout");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = alice.get(app.url("/api/users/me")).send().await.expect("me");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = client.get(app.url("/health")).send().await.expect("health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get(app.url("/health/ready")).send().await.expect("ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

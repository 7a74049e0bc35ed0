//! Login / logout flow tests

use axum::http::{header, StatusCode};
use serde_json::json;

mod common;
use common::{login, send, test_app, test_state, FakeCloudflare};

fn set_cookie(response: &common::TestResponse) -> String {
    response
        .headers
        .get(header::SET_COOKIE)
        .expect("response sets a cookie")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = test_app(test_state(FakeCloudflare::seeded()));

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "password123"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["username"], "admin");

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=604800"));

    // Token shape: 32 hex chars, underscore, 14-digit timestamp
    let token = cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("session_token=");
    let (random, stamp) = token.split_once('_').unwrap();
    assert_eq!(random.len(), 32);
    assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(stamp.len(), 14);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = test_app(test_state(FakeCloudflare::seeded()));

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "wrong"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.message(), "Invalid username or password");
    assert!(response.headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = test_app(test_state(FakeCloudflare::seeded()));

    for body in [
        json!({"username": "", "password": "password123"}),
        json!({"username": "admin", "password": ""}),
        json!({"username": "   ", "password": "password123"}),
    ] {
        let response = send(&app, "POST", "/api/auth/login", None, Some(body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.message().contains("required"), "{}", response.text);
    }
}

#[tokio::test]
async fn test_session_endpoint_reports_login() {
    let app = test_app(test_state(FakeCloudflare::seeded()));
    let cookie = login(&app).await;

    let response = send(&app, "GET", "/api/auth/session", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["authenticated"], true);
    assert_eq!(response.data()["username"], "admin");
}

#[tokio::test]
async fn test_api_logout_ends_session() {
    let state = test_state(FakeCloudflare::seeded());
    let app = test_app(state.clone());
    let cookie = login(&app).await;
    assert_eq!(state.sessions.len(), 1);

    let response = send(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert!(state.sessions.is_empty());

    let response = send(&app, "GET", "/api/status", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_page_logout_redirects_to_login() {
    let state = test_state(FakeCloudflare::seeded());
    let app = test_app(state.clone());
    let cookie = login(&app).await;

    let response = send(&app, "GET", "/logout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.headers.get(header::LOCATION).unwrap(), "/login");
    assert!(set_cookie(&response).contains("Expires=Thu, 01 Jan 1970"));
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_logout_without_session_still_clears_cookie() {
    let app = test_app(test_state(FakeCloudflare::seeded()));

    let response = send(&app, "POST", "/api/auth/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(set_cookie(&response).starts_with("session_token=;"));
}

#[tokio::test]
async fn test_each_login_creates_a_new_session() {
    let state = test_state(FakeCloudflare::seeded());
    let app = test_app(state.clone());

    let first = login(&app).await;
    let second = login(&app).await;
    assert_ne!(first, second);
    assert_eq!(state.sessions.len(), 2);
}

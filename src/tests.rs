//! # Tests Module
//!
//! Tests for configuration loading and the status server endpoints. The
//! dispatcher, cursor stores, OAuth signing and response parsing are tested
//! next to their code.
//!
//! Configuration tests go through `BotConfig::from_lookup` so they never touch
//! the process environment.

use crate::{
    config::{
        parse_poll_interval, BotConfig, DEFAULT_API_BASE_URL, DEFAULT_CURSOR_FILE,
        DEFAULT_REPLY_TEMPLATE,
    },
    cursor::{CursorStore, MemoryCursorStore, MentionId},
    handlers::{handle_health, router, AppState},
    twitter::BotIdentity,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Json,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn credentials_env() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("X_API_KEY", "consumer-key"),
        ("X_API_SECRET", "consumer-secret"),
        ("X_ACCESS_TOKEN", "1000-access-token"),
        ("X_ACCESS_TOKEN_SECRET", "access-token-secret"),
    ])
}

fn load(vars: &HashMap<&'static str, &'static str>) -> Result<BotConfig, String> {
    BotConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).map_err(|e| e.to_string())
}

/// Creates a status app backed by an in-memory cursor store.
fn create_test_app(store: Arc<dyn CursorStore>) -> axum::Router {
    router(AppState {
        bot: BotIdentity {
            id: "1000".to_string(),
            username: "replybot".to_string(),
        },
        store,
        poll_interval: Duration::from_secs(120),
    })
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

/// Only the four credentials are required; everything else has a default.
#[test]
fn test_config_defaults() {
    let config = load(&credentials_env()).unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(120));
    assert_eq!(config.reply_template, DEFAULT_REPLY_TEMPLATE);
    assert_eq!(config.default_handle, "friend");
    assert_eq!(config.cursor_file, PathBuf::from(DEFAULT_CURSOR_FILE));
    assert_eq!(config.database_url, None);
    assert_eq!(config.port, None);
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.credentials.api_key, "consumer-key");
    assert_eq!(config.credentials.access_token_secret, "access-token-secret");
}

#[test]
fn test_config_overrides() {
    let mut vars = credentials_env();
    vars.insert("POLL_INTERVAL_MINUTES", "5");
    vars.insert("REPLY_MESSAGE", "Hi @{username}!");
    vars.insert("DEFAULT_HANDLE", "there");
    vars.insert("CURSOR_FILE", "/var/lib/replybot/cursor.txt");
    vars.insert("DATABASE_URL", "postgres://localhost/replybot");
    vars.insert("PORT", "8080");
    vars.insert("X_API_BASE_URL", "http://localhost:9000/2/");

    let config = load(&vars).unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(300));
    assert_eq!(config.reply_template, "Hi @{username}!");
    assert_eq!(config.default_handle, "there");
    assert_eq!(
        config.cursor_file,
        PathBuf::from("/var/lib/replybot/cursor.txt")
    );
    assert_eq!(
        config.database_url.as_deref(),
        Some("postgres://localhost/replybot")
    );
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.api_base_url, "http://localhost:9000/2");

    let settings = config.reply_settings();
    assert_eq!(settings.template, "Hi @{username}!");
    assert_eq!(settings.default_handle, "there");
}

#[test]
fn test_config_requires_every_credential() {
    for missing in [
        "X_API_KEY",
        "X_API_SECRET",
        "X_ACCESS_TOKEN",
        "X_ACCESS_TOKEN_SECRET",
    ] {
        let mut vars = credentials_env();
        vars.remove(missing);
        let err = load(&vars).unwrap_err();
        assert!(err.contains(missing), "{}", err);

        vars.insert(missing, "");
        assert!(load(&vars).is_err());
    }
}

#[test]
fn test_config_rejects_invalid_port() {
    let mut vars = credentials_env();
    vars.insert("PORT", "not-a-port");
    assert!(load(&vars).unwrap_err().contains("PORT"));
}

#[test]
fn test_poll_interval_falls_back_to_default() {
    assert_eq!(parse_poll_interval(None), Duration::from_secs(120));
    assert_eq!(parse_poll_interval(Some("3")), Duration::from_secs(180));
    assert_eq!(parse_poll_interval(Some(" 10 ")), Duration::from_secs(600));
    assert_eq!(parse_poll_interval(Some("0")), Duration::from_secs(120));
    assert_eq!(parse_poll_interval(Some("soon")), Duration::from_secs(120));
    assert_eq!(parse_poll_interval(Some("-1")), Duration::from_secs(120));
    assert_eq!(
        parse_poll_interval(Some("307445734561825862")),
        Duration::from_secs(120)
    );
    assert_eq!(
        parse_poll_interval(Some("307445734561825860")),
        Duration::from_secs(307445734561825860 * 60)
    );
}

#[test]
fn test_credentials_debug_is_redacted() {
    let config = load(&credentials_env()).unwrap();
    let printed = format!("{:?}", config.credentials);
    assert!(!printed.contains("consumer-secret"));
    assert!(!printed.contains("access-token-secret"));
    assert!(printed.contains("[REDACTED]"));
}

#[tokio::test]
async fn test_handle_health() {
    let Json(json_response) = handle_health().await;

    assert_eq!(json_response["status"], "healthy");
    assert_eq!(json_response["service"], "replybot");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(MemoryCursorStore::new()));

    let (status, json_response) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_response["status"], "healthy");
}

#[tokio::test]
async fn test_status_endpoint_before_first_mention() {
    let app = create_test_app(Arc::new(MemoryCursorStore::new()));

    let (status, json_response) = get_json(app, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_response["bot_id"], "1000");
    assert_eq!(json_response["bot_username"], "replybot");
    assert!(json_response["last_mention_id"].is_null());
    assert_eq!(json_response["poll_interval_secs"], 120);
}

#[tokio::test]
async fn test_status_endpoint_reports_cursor() {
    let store = Arc::new(MemoryCursorStore::new());
    store
        .save(&MentionId::parse("1850000000000000001").unwrap())
        .await
        .unwrap();
    let app = create_test_app(store);

    let (_, json_response) = get_json(app, "/status").await;

    assert_eq!(json_response["last_mention_id"], "1850000000000000001");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_test_app(Arc::new(MemoryCursorStore::new()));

    let request = Request::builder()
        .uri("/tweet")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

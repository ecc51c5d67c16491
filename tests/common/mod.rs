//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use taskboard_notify::auth::StaticCredentials;
use taskboard_notify::config::{ApiConfig, RetryConfig};
use taskboard_notify::notifications::{HttpNotificationApi, NotificationSyncStore};
use taskboard_notify::sync::{ApiClient, RetryExecutor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token every test session uses
pub const TEST_TOKEN: &str = "test-token";

/// API configuration pointing at a mock server
pub fn create_test_api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_ms: 2000,
    }
}

/// Retry configuration with short delays
pub fn create_fast_retry_config() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        delay_ms: 5,
        backoff_factor: 2.0,
    }
}

/// Build a store talking to `server` with list retries enabled
pub fn create_test_store(
    server: &MockServer,
    session_active: bool,
) -> (Arc<NotificationSyncStore>, Arc<StaticCredentials>) {
    create_test_store_with_interval(server, session_active, Duration::from_secs(30))
}

/// Build a store with a custom poll interval
pub fn create_test_store_with_interval(
    server: &MockServer,
    session_active: bool,
    poll_interval: Duration,
) -> (Arc<NotificationSyncStore>, Arc<StaticCredentials>) {
    let credentials = Arc::new(StaticCredentials::new(TEST_TOKEN));
    let client = ApiClient::new(&create_test_api_config(server), credentials.clone())
        .expect("Failed to create API client");
    let api = HttpNotificationApi::new(client)
        .with_retry(RetryExecutor::new(create_fast_retry_config()));

    let store = Arc::new(NotificationSyncStore::with_poll_interval(
        Arc::new(api),
        poll_interval,
        session_active,
    ));
    (store, credentials)
}

/// One notification as the backend serializes it
pub fn entry_json(id: &str, recipients: &[&str], read_by: &[&str]) -> Value {
    json!({
        "_id": id,
        "type": "PROJECT_DUE_SOON",
        "project": { "_id": "p1", "title": "Roadmap" },
        "recipients": recipients,
        "readBy": read_by,
        "createdAt": "2024-05-01T12:00:00Z"
    })
}

/// List endpoint response body
pub fn list_body(entries: Vec<Value>) -> Value {
    json!({ "success": true, "data": { "notifications": entries } })
}

/// Mount the list endpoint answering with `entries`
pub async fn mount_list(server: &MockServer, entries: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(entries)))
        .mount(server)
        .await;
}

/// Number of requests the server saw for `method` on `path`
pub async fn count_requests(server: &MockServer, http_method: &str, url_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == url_path)
        .count()
}

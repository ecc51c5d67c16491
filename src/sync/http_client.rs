//! HTTP client for the taskboard REST backend
//!
//! This module wraps a `reqwest::Client` configured with the backend base URL,
//! a request timeout and JSON headers. The bearer token is taken from an
//! injected [`CredentialProvider`] on every request, and a 401 answer makes
//! the provider forget its token before the error is handed back.

use crate::auth::{authorization_value, CredentialProvider};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::ApiEnvelope;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Client for the REST backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_session", &self.credentials.has_session())
            .finish()
    }
}

impl ApiClient {
    /// Create a new client from configuration
    pub fn new(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.base_url, credentials))
    }

    /// Create a client around a custom reqwest Client
    pub fn with_client(
        client: Client,
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Full URL for a backend path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Credential provider this client authenticates with
    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Perform a GET request and return the raw body
    pub async fn get(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.send(Method::GET, path).await
    }

    /// Perform a PATCH request without a body and return the raw body
    pub async fn patch(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.send(Method::PATCH, path).await
    }

    /// Perform a DELETE request and return the raw body
    pub async fn delete(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.send(Method::DELETE, path).await
    }

    /// Send a request and map the response status
    ///
    /// Success statuses yield the body. Every other status becomes
    /// `ApiError::Http` carrying the code and the envelope message if the body
    /// has one.
    pub async fn send(&self, method: Method, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = self.credentials.access_token() {
            request = request.header(AUTHORIZATION, authorization_value(&token));
        }

        debug!(method = %method, url = %url, "Sending API request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else if e.is_connect() {
                ApiError::Connection
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        if status.is_success() {
            debug!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                body_size = body.len(),
                "Received response"
            );
            return Ok(body.to_vec());
        }

        let message = error_message(&body);

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(url = %url, "Session rejected, clearing credentials");
                self.credentials.clear();
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(url = %url, "Rate limited by backend");
            }
            status => {
                warn!(url = %url, status = status.as_u16(), "Request failed");
            }
        }

        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

/// Extract the envelope message from an error body, if it is one
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
}

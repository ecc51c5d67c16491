//! Notification endpoints of the REST backend
//!
//! [`NotificationApi`] is the seam the store talks through; the HTTP
//! implementation maps it onto the three notification endpoints and parses
//! every response envelope at the boundary.

use crate::error::ApiError;
use crate::models::notification::{
    parse_delete_result, parse_notification_item, parse_notification_list,
};
use crate::models::NotificationEntry;
use crate::sync::{ApiClient, RetryExecutor};
use async_trait::async_trait;
use tracing::debug;

/// Notification operations offered by the backend
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch the current user's notifications in server order
    async fn list(&self) -> Result<Vec<NotificationEntry>, ApiError>;

    /// Mark one notification as read, returning the updated entry
    async fn mark_as_read(&self, id: &str) -> Result<NotificationEntry, ApiError>;

    /// Hide one notification from the current user
    async fn delete(&self, id: &str) -> Result<bool, ApiError>;
}

/// [`NotificationApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: ApiClient,
    retry: Option<RetryExecutor>,
}

impl HttpNotificationApi {
    /// Create an API without retry on list fetches
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            retry: None,
        }
    }

    /// Run list fetches through the given retry executor
    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = Some(retry);
        self
    }

    async fn fetch_list(&self) -> Result<Vec<NotificationEntry>, ApiError> {
        let body = self.client.get("/notifications").await?;
        parse_notification_list(&body)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self) -> Result<Vec<NotificationEntry>, ApiError> {
        let entries = match &self.retry {
            Some(retry) => retry.execute(|| self.fetch_list()).await?,
            None => self.fetch_list().await?,
        };
        debug!(count = entries.len(), "Fetched notifications");
        Ok(entries)
    }

    async fn mark_as_read(&self, id: &str) -> Result<NotificationEntry, ApiError> {
        let body = self
            .client
            .patch(&format!("/notifications/{}/read", id))
            .await?;
        parse_notification_item(&body)
    }

    async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let body = self.client.delete(&format!("/notifications/{}", id)).await?;
        parse_delete_result(&body)
    }
}

//! Notification domain models
//!
//! This module defines the notification entry as delivered by the backend,
//! the response envelope every endpoint wraps its payload in, and the
//! display helpers used when listing entries.

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Label shown when the referenced project no longer exists
pub const DELETED_PROJECT_LABEL: &str = "deleted project";

/// Kind of event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// A project the user belongs to was created
    ProjectCreated,
    /// A project deadline is close
    ProjectDueSoon,
    /// A project reached its end date
    ProjectEnded,
    /// A project was canceled
    ProjectCanceled,
}

impl NotificationType {
    /// Short label for list chips
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::ProjectCreated => "New",
            NotificationType::ProjectDueSoon => "Due soon",
            NotificationType::ProjectEnded => "Ended",
            NotificationType::ProjectCanceled => "Canceled",
        }
    }

    /// Visual weight of the label
    pub fn tone(&self) -> Tone {
        match self {
            NotificationType::ProjectCreated => Tone::Info,
            NotificationType::ProjectDueSoon => Tone::Warning,
            NotificationType::ProjectEnded | NotificationType::ProjectCanceled => Tone::Critical,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::ProjectCreated => write!(f, "PROJECT_CREATED"),
            NotificationType::ProjectDueSoon => write!(f, "PROJECT_DUE_SOON"),
            NotificationType::ProjectEnded => write!(f, "PROJECT_ENDED"),
            NotificationType::ProjectCanceled => write!(f, "PROJECT_CANCELED"),
        }
    }
}

/// Display tone for a notification label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Informational
    Info,
    /// Needs attention soon
    Warning,
    /// Terminal project state
    Critical,
}

/// Weak reference to the project a notification is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Project ID
    #[serde(rename = "_id")]
    pub id: String,

    /// Project title at the time the notification was produced
    pub title: String,
}

/// One notification record shown to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntry {
    /// Server-assigned ID
    #[serde(rename = "_id")]
    pub id: String,

    /// Event kind
    #[serde(rename = "type")]
    pub kind: NotificationType,

    /// Related project, `None` once the project is deleted
    #[serde(default)]
    pub project: Option<ProjectRef>,

    /// Users for whom the entry is still pending
    #[serde(rename = "recipients", default)]
    pub recipient_ids: Vec<String>,

    /// Users who acknowledged the entry
    #[serde(rename = "readBy", default)]
    pub read_by_ids: Vec<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Server-provided title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Server-provided body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotificationEntry {
    /// Create an entry with no project, recipients or readers
    pub fn new(id: impl Into<String>, kind: NotificationType) -> Self {
        Self {
            id: id.into(),
            kind,
            project: None,
            recipient_ids: Vec::new(),
            read_by_ids: Vec::new(),
            created_at: Utc::now(),
            title: None,
            content: None,
        }
    }

    /// Set the related project
    pub fn with_project(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.project = Some(ProjectRef {
            id: id.into(),
            title: title.into(),
        });
        self
    }

    /// Set the pending recipients
    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipient_ids = recipients;
        self
    }

    /// Set the readers
    pub fn with_read_by(mut self, read_by: Vec<String>) -> Self {
        self.read_by_ids = read_by;
        self
    }

    /// Whether the entry counts towards the unread badge
    pub fn is_unread(&self) -> bool {
        !self.recipient_ids.is_empty()
    }

    /// Whether someone already acknowledged the entry
    pub fn is_acknowledged(&self) -> bool {
        !self.read_by_ids.is_empty()
    }

    /// Project title, or the deleted-project label when the project is gone
    pub fn project_title(&self) -> &str {
        self.project
            .as_ref()
            .map(|p| p.title.as_str())
            .unwrap_or(DELETED_PROJECT_LABEL)
    }

    /// Human-readable sentence describing the entry
    pub fn message(&self) -> String {
        let title = self.project_title();
        match self.kind {
            NotificationType::ProjectCreated => format!("New project \"{}\" was created.", title),
            NotificationType::ProjectDueSoon => {
                format!("Project \"{}\" is due in 7 days.", title)
            }
            NotificationType::ProjectEnded => format!("Project \"{}\" has ended.", title),
            NotificationType::ProjectCanceled => "A project was canceled.".to_string(),
        }
    }
}

/// JSON envelope wrapping every backend response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the backend handled the request
    pub success: bool,

    /// Payload, absent on most failures and on delete
    pub data: Option<T>,

    /// Optional human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, failing on `success: false` or missing data
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::InvalidResponse("envelope has no data".to_string()))
    }

    /// Check the success flag only, for endpoints without a payload
    pub fn into_success(self) -> Result<bool, ApiError> {
        if self.success {
            Ok(true)
        } else {
            Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ))
        }
    }
}

/// Payload of `GET /notifications`
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationList {
    /// Entries in server order
    pub notifications: Vec<NotificationEntry>,
}

/// Payload of `PATCH /notifications/{id}/read`
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationItem {
    /// Updated entry
    pub notification: NotificationEntry,
}

/// Decode an envelope from raw bytes
pub fn parse_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<ApiEnvelope<T>, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Parse the body of `GET /notifications`
pub fn parse_notification_list(body: &[u8]) -> Result<Vec<NotificationEntry>, ApiError> {
    parse_envelope::<NotificationList>(body)?
        .into_data()
        .map(|list| list.notifications)
}

/// Parse the body of `PATCH /notifications/{id}/read`
pub fn parse_notification_item(body: &[u8]) -> Result<NotificationEntry, ApiError> {
    parse_envelope::<NotificationItem>(body)?
        .into_data()
        .map(|item| item.notification)
}

/// Parse the body of `DELETE /notifications/{id}`
pub fn parse_delete_result(body: &[u8]) -> Result<bool, ApiError> {
    parse_envelope::<serde_json::Value>(body)?.into_success()
}

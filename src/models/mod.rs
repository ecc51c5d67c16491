//! Domain models for taskboard-notify
//!
//! This module contains the notification types exchanged with the backend.

pub mod notification;

// Re-export commonly used types
pub use notification::{
    ApiEnvelope, NotificationEntry, NotificationType, ProjectRef, Tone, DELETED_PROJECT_LABEL,
};

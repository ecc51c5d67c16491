//! Notification synchronization
//!
//! - [`api`]: Backend operations behind the [`NotificationApi`] trait
//! - [`store`]: Cached notifications, unread count and background polling

pub mod api;
pub mod store;

pub use api::{HttpNotificationApi, NotificationApi};
pub use store::{count_unread, MarkReadOutcome, NotificationSnapshot, NotificationSyncStore};

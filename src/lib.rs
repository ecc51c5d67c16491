//! taskboard-notify - Notification sync client for the taskboard backend
//!
//! This crate keeps a local, polled copy of the current user's notifications
//! with an unread badge count, and offers mark-as-read and delete on top of
//! it. Rate-limited list fetches are retried with exponential backoff.

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod sync;

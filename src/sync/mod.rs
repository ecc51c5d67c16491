//! Backend communication infrastructure
//!
//! This module provides the plumbing the notification store is built on:
//! an authenticated HTTP client, a retry executor for rate-limited calls and
//! a scheduler for periodic background refreshes.
//!
//! # Components
//!
//! - [`retry`]: Retry executor with exponential backoff on HTTP 429
//! - [`http_client`]: Authenticated JSON client for the REST backend
//! - [`scheduler`]: Periodic poll task with cancellable handle
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskboard_notify::auth::StaticCredentials;
//! use taskboard_notify::config::{ApiConfig, RetryConfig};
//! use taskboard_notify::sync::{ApiClient, RetryExecutor};
//!
//! let client = ApiClient::new(&ApiConfig::default(), Arc::new(StaticCredentials::new("token")))?;
//! let retry = RetryExecutor::new(RetryConfig::default());
//!
//! let body = retry.execute(|| client.get("/notifications")).await?;
//! ```

pub mod http_client;
pub mod retry;
pub mod scheduler;

// Re-export main types for convenience
pub use http_client::ApiClient;
pub use retry::RetryExecutor;
pub use scheduler::{PollHandle, PollScheduler, Pollable};

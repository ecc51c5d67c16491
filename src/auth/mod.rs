//! Session credentials for taskboard-notify
//!
//! This module provides the credential provider abstraction injected into the
//! HTTP client, with in-memory and file-backed implementations.

pub mod credentials;

pub use credentials::{
    authorization_value, CredentialProvider, FileCredentials, StaticCredentials, BEARER_PREFIX,
};

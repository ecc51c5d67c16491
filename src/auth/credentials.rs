//! Session credential providers
//!
//! The HTTP client never reads tokens from ambient storage. It is handed a
//! [`CredentialProvider`] at construction and asks it for the current access
//! token on every request, and tells it to forget the token when the backend
//! rejects the session.

use crate::error::CredentialError;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// Scheme prefix for the Authorization header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Source of the session access token
pub trait CredentialProvider: Send + Sync {
    /// Current access token, if a session exists
    fn access_token(&self) -> Option<String>;

    /// Forget the current token (called when the backend answers 401)
    fn clear(&self);

    /// Whether a session token is currently available
    fn has_session(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Build the Authorization header value for a stored token
///
/// Tokens stored with their scheme are used verbatim.
pub fn authorization_value(token: &str) -> String {
    if token.starts_with(BEARER_PREFIX) {
        token.to_string()
    } else {
        format!("{}{}", BEARER_PREFIX, token)
    }
}

/// Token held in memory only
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<String>>,
}

impl StaticCredentials {
    /// Create a provider holding the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Create a provider with no session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Replace the stored token
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }
}

impl CredentialProvider for StaticCredentials {
    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Token persisted in a file
///
/// The file is read once at construction; `clear()` forgets the cached token
/// and removes the file so the next process start has no session either.
#[derive(Debug)]
pub struct FileCredentials {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileCredentials {
    /// Load the token from `path`; a missing or empty file means no session
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CredentialError> {
        let path = path.as_ref().to_path_buf();
        let token = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), has_token = token.is_some(), "Loaded credential file");

        Ok(Self {
            path,
            token: RwLock::new(token),
        })
    }

    /// Persist a new token
    pub fn store(&self, token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialProvider for FileCredentials {
    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed credential file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove credential file"),
        }
    }
}

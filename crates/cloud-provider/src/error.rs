//! Provider errors

use thiserror::Error;

/// Errors returned by the control plane
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Retryable failure, e.g. a just-created dependency is not visible yet
    #[error("transient error: {0}")]
    Transient(String),

    /// Definitive rejection (invalid input, quota, conflict)
    #[error("{0}")]
    Permanent(String),

    /// The named resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A resource with the same name already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether the failed call may succeed if simply repeated
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transient(_) => true,
            ProviderError::Http(e) => e.is_timeout() || e.is_connect(),
            ProviderError::Permanent(_)
            | ProviderError::NotFound(_)
            | ProviderError::AlreadyExists(_)
            | ProviderError::Serialization(_) => false,
        }
    }
}

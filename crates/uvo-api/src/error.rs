//! Error taxonomy for the owners service

use thiserror::Error;

/// Result type for owners-service operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the owners service
///
/// The split matters to callers: authentication failures require the user
/// to re-enter credentials, everything else is treated as a transient
/// upstream condition and retried on the next scheduled refresh.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid or expired credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The remote service answered with an error
    #[error("owners service error: {0}")]
    Upstream(String),

    /// The request never completed (connect, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response decoded, but not into anything usable
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl ApiError {
    /// True when the caller should prompt for fresh credentials
    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_classification() {
        assert!(ApiError::Authentication("bad password".into()).is_authentication());
        assert!(!ApiError::Upstream("503".into()).is_authentication());
        assert!(!ApiError::Payload("missing field".into()).is_authentication());
    }
}

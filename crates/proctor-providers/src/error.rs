//! Portal error types.

use thiserror::Error;

/// Errors that can occur when talking to the recruitment portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Authentication failed (missing or invalid API token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No assessment paper exists for this applicant.
    #[error("assessment paper not found")]
    PaperNotFound,

    /// The portal returned an error response.
    #[error("portal error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The portal responded, but the paper was empty or malformed.
    #[error("malformed paper: {0}")]
    MalformedPaper(String),
}

impl PortalError {
    /// Returns `true` if a later manual retry of the same request could
    /// plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortalError::Timeout(_)
                | PortalError::NetworkError(_)
                | PortalError::ApiError {
                    status: 500..=599,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(PortalError::Timeout(30).is_transient());
        assert!(PortalError::NetworkError("reset".into()).is_transient());
        assert!(PortalError::ApiError {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(!PortalError::AuthenticationFailed("bad token".into()).is_transient());
        assert!(!PortalError::ApiError {
            status: 422,
            message: "rejected".into()
        }
        .is_transient());
        assert!(!PortalError::MalformedPaper("no sections".into()).is_transient());
    }
}

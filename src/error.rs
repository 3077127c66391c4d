//! Error types for the Sibyl assistant

use thiserror::Error;

/// Result type alias for Sibyl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for external capability calls
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;

/// Errors that can occur in the Sibyl assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// External capability failure (embedding, completion, STT, TTS)
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// Memory log cannot be persisted
    #[error("persistence error: {0}")]
    Persistence(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Memory log parse/write error
    #[error("memory log error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure of an external capability service
///
/// These never abort the session loop: the orchestrator degrades to an empty
/// context, an empty answer, or skipped speech output instead.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Authentication/authorization rejected (401/403)
    #[error("auth error: {0}")]
    Auth(String),

    /// Rate limit or quota exhausted (429)
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// Network failure, including request timeouts
    #[error("network error: {0}")]
    Network(String),

    /// Service returned a non-success status
    #[error("service error {status}: {body}")]
    Service { status: u16, body: String },

    /// Response could not be parsed
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Local audio capture/playback failure at the capability boundary
    #[error("audio error: {0}")]
    Audio(String),
}

impl CapabilityError {
    /// Classify an HTTP error status into a capability error kind
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth(body),
            429 => Self::Quota(body),
            status => Self::Service { status, body },
        }
    }
}

impl From<reqwest::Error> for CapabilityError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let auth = CapabilityError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "bad key".to_string(),
        );
        assert!(matches!(auth, CapabilityError::Auth(_)));

        let quota = CapabilityError::from_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
        );
        assert!(matches!(quota, CapabilityError::Quota(_)));

        let service = CapabilityError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
        );
        assert!(matches!(service, CapabilityError::Service { status: 500, .. }));
    }
}

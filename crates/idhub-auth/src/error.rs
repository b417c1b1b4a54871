//! Error types for the remote JWT service and token issuance

use thiserror::Error;

/// Result alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Failures talking to the remote JWT service or interpreting its answers.
///
/// A signature that does not verify, or a token that has expired, is not an
/// error: those produce a negative [`Verdict`](crate::Verdict).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request never produced a response
    #[error("JWT service request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint that was called
        endpoint: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("JWT service {endpoint} returned {status}: {body}")]
    Status {
        /// Endpoint that was called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Malformed JWT service response: {0}")]
    MalformedPayload(String),

    /// A decoded JWT lacks a required field
    #[error("JWT is missing required field: {0}")]
    MissingClaim(&'static str),
}

impl AuthError {
    /// Shorthand for a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Whether the failure happened before the service produced an answer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ClientBuild(_))
    }
}

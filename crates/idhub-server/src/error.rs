//! Business-rule failures surfaced in response error lists

use thiserror::Error;

/// A request was well-formed but violates a ledger rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Identical claim already submitted
    #[error("Claim existed.")]
    ClaimExisted,

    /// No claim matches the attestation target
    #[error("Claim not found.")]
    ClaimNotFound,

    /// The JWT subject does not name a claim type
    #[error("JWT subject does not name a claim type: {0:?}")]
    MissingClaimType(String),

    /// Attestant status is not APPROVED or REJECTED
    #[error("Invalid attestation status: {0}")]
    InvalidStatus(String),

    /// Claim id is not an integer
    #[error("Invalid claim id: {0}")]
    InvalidClaimId(String),

    /// `page` query parameter is not an integer
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// A required registration field is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

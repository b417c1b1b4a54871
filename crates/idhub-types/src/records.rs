//! Ledger records
//!
//! One type per persisted row kind, plus the write-side inputs the store
//! accepts. Field names serialize in the camelCase the HTTP API uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scope::ScopeField;

/// A row of the token ledger: the resolution of one correlation token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque correlation token (primary key)
    pub token: String,
    /// Whether the resolving JWT verified and had not expired
    pub valid: bool,
    /// Proxy identifier of the resolving user
    pub proxy: String,
    /// Raw scope string granted by the user
    pub scope: String,
    /// Time of the latest resolution
    pub created: String,
}

impl TokenRecord {
    /// A record counts as resolved once it carries a scope
    pub fn is_resolved(&self) -> bool {
        !self.scope.is_empty()
    }
}

/// Write input for the token ledger upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResolution {
    /// Correlation token being resolved
    pub token: String,
    /// Resolution verdict
    pub valid: bool,
    /// Resolved identity
    pub proxy: String,
    /// Granted scope
    pub scope: String,
}

/// Claim lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimStatus {
    /// Submitted, awaiting attestation
    Pending,
    /// Approved by an attestant
    Approved,
    /// Rejected by an attestant
    Rejected,
}

impl ClaimStatus {
    /// Wire / column representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether an attestant may move a claim into this status
    pub const fn is_verdict(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not a known claim status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown claim status: {0}")]
pub struct ParseClaimStatusError(pub String);

impl FromStr for ClaimStatus {
    type Err = ParseClaimStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(ParseClaimStatusError(other.to_string())),
        }
    }
}

/// A row of the claim ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Row id
    pub id: i64,
    /// Proxy identifier of the claimant
    pub proxy: String,
    /// Attestation category, upper-cased (e.g. `ID`)
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Lifecycle status
    pub status: ClaimStatus,
    /// Raw signed claim JWT
    pub claim: String,
    /// Submission time
    pub created: String,
    /// Last status change
    pub updated: String,
}

/// Write input for claim submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    /// Claimant proxy
    pub proxy: String,
    /// Attestation category
    pub claim_type: String,
    /// Raw signed claim JWT
    pub claim: String,
}

/// A row of the attestation ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRecord {
    /// Row id
    pub id: i64,
    /// Attested claim
    pub claim_id: i64,
    /// Attestant identity
    pub attestant: String,
    /// Signed attestation JWT
    pub attestation: String,
    /// Attestant's verdict
    pub status: ClaimStatus,
    /// First attestation time
    pub created: String,
    /// Latest attestation time
    pub updated: String,
}

/// Write input for an attestant action on a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttestation {
    /// Attested claim
    pub claim_id: i64,
    /// Attestant identity
    pub attestant: String,
    /// Signed attestation JWT
    pub attestation: String,
    /// Verdict
    pub status: ClaimStatus,
}

/// A user profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Row id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Identity document number
    pub id_number: String,
    /// Phone number
    pub phone: String,
    /// Email address
    pub email: String,
    /// Country
    pub country: String,
    /// Region / state
    pub region: String,
    /// City
    pub locality: String,
    /// Street address
    pub street_address: String,
    /// Postal code
    pub postal_code: String,
    /// Public key
    pub public_key: String,
    /// Blockchain address
    pub address: String,
    /// Proxy identifier (lookup key)
    pub proxy: String,
    /// Proxy controller
    pub controller: String,
    /// Proxy recovery account
    pub recovery: String,
    /// IPFS pointer
    pub ipfs: String,
    /// Free-text description
    pub description: String,
    /// Registration time
    pub created: String,
    /// Last update time
    pub updated: String,
}

impl UserRecord {
    /// Stored value for a scope field
    pub fn field(&self, field: ScopeField) -> &str {
        match field {
            ScopeField::Address => &self.address,
            ScopeField::Controller => &self.controller,
            ScopeField::Created => &self.created,
            ScopeField::Description => &self.description,
            ScopeField::Email => &self.email,
            ScopeField::Id => &self.id_number,
            ScopeField::Ipfs => &self.ipfs,
            ScopeField::Name => &self.name,
            ScopeField::Phone => &self.phone,
            ScopeField::Proxy => &self.proxy,
            ScopeField::PublicKey => &self.public_key,
            ScopeField::Recovery => &self.recovery,
            ScopeField::Updated => &self.updated,
        }
    }
}

/// Registration input for a user profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Identity document number
    #[serde(default, rename = "idNumber")]
    pub id_number: String,
    /// Phone number
    #[serde(default)]
    pub phone: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Country
    #[serde(default)]
    pub country: String,
    /// Region / state
    #[serde(default)]
    pub region: String,
    /// City
    #[serde(default)]
    pub locality: String,
    /// Street address
    #[serde(default)]
    pub street_address: String,
    /// Postal code
    #[serde(default)]
    pub postal_code: String,
    /// Public key (unique)
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Blockchain address
    #[serde(default)]
    pub address: String,
    /// Proxy identifier (unique)
    pub proxy: String,
    /// Proxy controller
    #[serde(default)]
    pub controller: String,
    /// Proxy recovery account
    #[serde(default)]
    pub recovery: String,
    /// IPFS pointer
    #[serde(default)]
    pub ipfs: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

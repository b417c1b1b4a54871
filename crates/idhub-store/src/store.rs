//! The ledger store seam

use async_trait::async_trait;
use std::fmt;

use idhub_types::{
    AttestationRecord, ClaimRecord, ClaimStatus, NewAttestation, NewClaim, NewUser, TokenRecord,
    TokenResolution, UserRecord,
};

use crate::error::StoreResult;

/// Result of a claim submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimSubmission {
    /// A new PENDING claim was stored
    Inserted(ClaimRecord),
    /// A claim with the same proxy, type and content already exists
    Existed,
}

/// What happened to the attestation row during an attestant action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationWrite {
    /// First approval by this attestant
    Inserted,
    /// The attestant's existing row was overwritten
    Updated,
    /// A rejection from an attestant with no prior row; nothing stored
    Skipped,
}

impl AttestationWrite {
    /// Whether the attestation content is now stored
    pub const fn stored(self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Outcome of [`LedgerStore::attest_claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attested {
    /// New claim status
    pub status: ClaimStatus,
    /// Time the claim status was changed
    pub updated: String,
    /// Effect on the attestation ledger
    pub write: AttestationWrite,
}

/// Identifies the claim an attestant acts on.
///
/// All three fields must match the stored claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTarget {
    /// Claim id
    pub id: i64,
    /// Claimant proxy
    pub proxy: String,
    /// Claim type
    pub claim_type: String,
}

/// Result of a user registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRegistration {
    /// Profile stored under a new id
    Registered(UserRecord),
    /// A user with the same public key already exists; nothing written
    Existing,
}

/// Persistent ledgers shared by every request.
///
/// The store is the only source of truth: callers never cache records across
/// requests. Every write that has a read-then-write shape is a single atomic
/// operation here.
#[async_trait]
pub trait LedgerStore: Send + Sync + fmt::Debug {
    /// Insert or overwrite the resolution for a token
    async fn upsert_token(&self, resolution: TokenResolution) -> StoreResult<()>;

    /// Current ledger row for a token
    async fn find_token(&self, token: &str) -> StoreResult<Option<TokenRecord>>;

    /// Store a PENDING claim unless an identical one exists
    async fn submit_claim(&self, claim: NewClaim) -> StoreResult<ClaimSubmission>;

    /// Move the target claim to the attestant's verdict and record the
    /// attestation, in one transaction.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) when
    /// no claim matches `target`.
    async fn attest_claim(
        &self,
        target: ClaimTarget,
        attestation: NewAttestation,
    ) -> StoreResult<Attested>;

    /// Most recently created claim of a type for a proxy, any status
    async fn latest_claim(&self, proxy: &str, claim_type: &str)
    -> StoreResult<Option<ClaimRecord>>;

    /// Most recently created APPROVED claim of a type for a proxy
    async fn latest_approved_claim(
        &self,
        proxy: &str,
        claim_type: &str,
    ) -> StoreResult<Option<ClaimRecord>>;

    /// Most recently written attestation of a claim, any status
    async fn latest_attestation(&self, claim_id: i64) -> StoreResult<Option<AttestationRecord>>;

    /// Most recently created APPROVED attestation of a claim
    async fn latest_approved_attestation(
        &self,
        claim_id: i64,
    ) -> StoreResult<Option<AttestationRecord>>;

    /// Number of PENDING claims of a type
    async fn count_pending(&self, claim_type: &str) -> StoreResult<u64>;

    /// PENDING claims of a type, oldest first
    async fn list_pending(
        &self,
        claim_type: &str,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<ClaimRecord>>;

    /// User profile by proxy
    async fn find_user(&self, proxy: &str) -> StoreResult<Option<UserRecord>>;

    /// Store a user profile unless its public key is already registered
    async fn register_user(&self, user: NewUser) -> StoreResult<UserRegistration>;
}

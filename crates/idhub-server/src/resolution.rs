//! Token resolution
//!
//! A user (or attestant) posts a JWT signed with their own key. Each flow
//! decodes it, computes the verdict and persists what the verdict allows.
//! Failures are appended to the caller's [`ErrorList`]; a failed verify call
//! still records the resolution, with `valid = false`.

use std::sync::Arc;
use tracing::{debug, info};

use idhub_auth::claims::{
    ATTESTANT_PUBLIC_KEY, CLAIM_SUBJECT_PREFIX, RETRIEVAL_SUBJECT_PREFIX, SCOPE, TOKEN,
    USER_PROXY, USER_PUBLIC_KEY,
};
use idhub_auth::{JwtPayload, JwtService, Verdict, evaluate, is_expired, now_unix};
use idhub_store::{ClaimSubmission, ClaimTarget, LedgerStore, StoreError};
use idhub_types::{ClaimRecord, ClaimStatus, NewAttestation, NewClaim, TokenResolution, Workflow};

use crate::envelope::ErrorList;
use crate::error::ResolutionError;

/// Status reported by attestation retrieval when nothing could be looked up
pub const RETRIEVAL_ERROR_STATUS: &str = "ERROR";

/// An attestant's verdict on a claim
#[derive(Debug, Clone)]
pub struct AttestationAction {
    /// Attestant identity
    pub attestant: String,
    /// Signed attestation JWT
    pub attestation: String,
    /// Target claim id, as sent
    pub claim_id: String,
    /// Target claim type
    pub claim_type: String,
    /// Claimant proxy
    pub proxy: String,
    /// `APPROVED` or `REJECTED`
    pub status: String,
}

/// Result of an attestant action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttestationOutcome {
    /// The claim status was changed
    pub attested: bool,
    /// New claim status
    pub status: Option<ClaimStatus>,
    /// Time of the change
    pub updated: Option<String>,
    /// Stored attestation content, if any was written
    pub stored: Option<(String, String)>,
}

/// Result of a claim submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Verdict on the claim JWT
    pub valid: bool,
    /// Newly stored claim
    pub claim: Option<ClaimRecord>,
}

/// Result of an attestation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    /// Latest claim status, or `ERROR`
    pub status: String,
    /// Latest approved attestation of an APPROVED claim
    pub attestation: Option<String>,
}

impl Default for Retrieval {
    fn default() -> Self {
        Self {
            status: RETRIEVAL_ERROR_STATUS.to_string(),
            attestation: None,
        }
    }
}

/// Runs the resolution flows against the JWT service and the ledgers
#[derive(Debug, Clone)]
pub struct Resolver {
    jwt: Arc<dyn JwtService>,
    store: Arc<dyn LedgerStore>,
}

impl Resolver {
    /// Create a resolver
    pub fn new(jwt: Arc<dyn JwtService>, store: Arc<dyn LedgerStore>) -> Self {
        Self { jwt, store }
    }

    /// Decode `raw` and judge it against the key named by `key_field`.
    ///
    /// `None` when the token cannot be decoded or names no key.
    async fn check(
        &self,
        raw: &str,
        key_field: &'static str,
        errors: &mut ErrorList,
    ) -> Option<(JwtPayload, Verdict)> {
        let payload = errors.record(self.jwt.decode(raw).await)?;
        let public_key = errors.record(payload.require_context(key_field))?.to_string();

        let verdict = match evaluate(self.jwt.as_ref(), raw, &payload, &public_key).await {
            Ok(verdict) => verdict,
            Err(e) => {
                errors.push(e);
                Verdict {
                    verified: false,
                    expired: is_expired(payload.expires_at(), now_unix()),
                }
            }
        };
        debug!(verified = verdict.verified, expired = verdict.expired, "JWT judged");
        Some((payload, verdict))
    }

    /// Resolve a login or authorization JWT into the token ledger.
    ///
    /// Returns the verdict; the ledger records it either way.
    pub async fn resolve_token(
        &self,
        workflow: Workflow,
        raw: &str,
        errors: &mut ErrorList,
    ) -> bool {
        let Some((payload, verdict)) = self.check(raw, USER_PUBLIC_KEY, errors).await else {
            return false;
        };
        let Some(token) = errors.record(payload.require_context(TOKEN)) else {
            return false;
        };

        let resolution = TokenResolution {
            token: token.to_string(),
            valid: verdict.valid(),
            proxy: payload.context_or_empty(USER_PROXY).to_string(),
            scope: payload.context_or_empty(SCOPE).to_string(),
        };
        if errors.record(self.store.upsert_token(resolution).await).is_some() {
            info!(%workflow, valid = verdict.valid(), "Token resolved");
        }
        verdict.valid()
    }

    /// Submit a user-signed claim for attestation
    pub async fn submit_claim(&self, raw: &str, errors: &mut ErrorList) -> ClaimOutcome {
        let Some((payload, verdict)) = self.check(raw, USER_PUBLIC_KEY, errors).await else {
            return ClaimOutcome::default();
        };
        let Some(claim_type) = payload.subject_type(CLAIM_SUBJECT_PREFIX) else {
            errors.push(ResolutionError::MissingClaimType(payload.sub.clone()));
            return ClaimOutcome::default();
        };
        let proxy = payload.context_or_empty(USER_PROXY).to_string();
        let valid = verdict.valid();

        if let Some(token) = payload.context_str(TOKEN) {
            let resolution = TokenResolution {
                token: token.to_string(),
                valid,
                proxy: proxy.clone(),
                scope: claim_type.clone(),
            };
            errors.record(self.store.upsert_token(resolution).await);
        }

        if !valid {
            return ClaimOutcome { valid, claim: None };
        }

        let submission = self
            .store
            .submit_claim(NewClaim {
                proxy,
                claim_type,
                claim: raw.to_string(),
            })
            .await;
        let claim = match submission {
            Ok(ClaimSubmission::Inserted(record)) => {
                info!(id = record.id, claim_type = %record.claim_type, "Claim submitted");
                Some(record)
            }
            Ok(ClaimSubmission::Existed) => {
                errors.push(ResolutionError::ClaimExisted);
                None
            }
            Err(e) => {
                errors.push(e);
                None
            }
        };
        ClaimOutcome { valid, claim }
    }

    /// Apply an attestant's verdict to a claim
    pub async fn attest(
        &self,
        action: AttestationAction,
        errors: &mut ErrorList,
    ) -> AttestationOutcome {
        let Some((_, verdict)) = self
            .check(&action.attestation, ATTESTANT_PUBLIC_KEY, errors)
            .await
        else {
            return AttestationOutcome::default();
        };
        if !verdict.valid() {
            return AttestationOutcome::default();
        }

        let status = match action.status.parse::<ClaimStatus>() {
            Ok(status) if status.is_verdict() => status,
            _ => {
                errors.push(ResolutionError::InvalidStatus(action.status));
                return AttestationOutcome::default();
            }
        };
        let Ok(claim_id) = action.claim_id.trim().parse::<i64>() else {
            errors.push(ResolutionError::InvalidClaimId(action.claim_id));
            return AttestationOutcome::default();
        };

        let target = ClaimTarget {
            id: claim_id,
            proxy: action.proxy,
            claim_type: action.claim_type.trim().to_uppercase(),
        };
        let attestation = NewAttestation {
            claim_id,
            attestant: action.attestant,
            attestation: action.attestation,
            status,
        };
        let stored = (attestation.attestant.clone(), attestation.attestation.clone());

        match self.store.attest_claim(target, attestation).await {
            Ok(attested) => {
                info!(claim_id, status = %attested.status, "Claim attested");
                AttestationOutcome {
                    attested: true,
                    status: Some(attested.status),
                    updated: Some(attested.updated),
                    stored: attested.write.stored().then_some(stored),
                }
            }
            Err(StoreError::NotFound(_)) => {
                errors.push(ResolutionError::ClaimNotFound);
                AttestationOutcome::default()
            }
            Err(e) => {
                errors.push(e);
                AttestationOutcome::default()
            }
        }
    }

    /// Look up the attestation state of the caller's latest claim of the
    /// type named in the retrieval JWT subject
    pub async fn retrieve_attestation(&self, raw: &str, errors: &mut ErrorList) -> Retrieval {
        let mut retrieval = Retrieval::default();
        let Some((payload, verdict)) = self.check(raw, USER_PUBLIC_KEY, errors).await else {
            return retrieval;
        };
        let Some(claim_type) = payload.subject_type(RETRIEVAL_SUBJECT_PREFIX) else {
            errors.push(ResolutionError::MissingClaimType(payload.sub.clone()));
            return retrieval;
        };
        if !verdict.valid() {
            return retrieval;
        }

        let proxy = payload.context_or_empty(USER_PROXY);
        let Some(claim) = errors
            .record(self.store.latest_claim(proxy, &claim_type).await)
            .flatten()
        else {
            return retrieval;
        };

        retrieval.status = claim.status.to_string();
        if claim.status == ClaimStatus::Approved {
            retrieval.attestation = errors
                .record(self.store.latest_approved_attestation(claim.id).await)
                .flatten()
                .map(|a| a.attestation);
        }
        retrieval
    }
}

//! Validity verdicts for user-signed JWTs

use chrono::Utc;

use crate::claims::JwtPayload;
use crate::client::JwtService;
use crate::error::AuthResult;

/// Outcome of checking a decoded JWT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    /// The signature verified against the declared key
    pub verified: bool,
    /// `exp` was missing or not in the future
    pub expired: bool,
}

impl Verdict {
    /// Verified and not expired
    pub const fn valid(self) -> bool {
        self.verified && !self.expired
    }
}

/// Current unix time in seconds
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// `exp - now <= 0`. A token without an expiry is expired.
pub fn is_expired(exp: Option<i64>, now: i64) -> bool {
    match exp {
        Some(exp) => exp.saturating_sub(now) <= 0,
        None => true,
    }
}

/// Check expiry and signature of `raw`, whose decoded form is `payload`,
/// against `public_key`.
///
/// # Errors
///
/// Propagates failures of the verify call.
pub async fn evaluate(
    service: &dyn JwtService,
    raw: &str,
    payload: &JwtPayload,
    public_key: &str,
) -> AuthResult<Verdict> {
    let expired = is_expired(payload.expires_at(), now_unix());
    let verified = service.verify(public_key, raw).await?;
    Ok(Verdict { verified, expired })
}

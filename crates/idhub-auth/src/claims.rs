//! JWT payload shapes
//!
//! [`JwtPayload`] is what the decode endpoint hands back for any token,
//! client- or user-signed. Numeric claims arrive in whatever JSON form the
//! signer produced, so `exp` is kept as a raw value and interpreted lazily.
//! [`ServerClaims`] is the payload the server asks the encode endpoint to sign.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{AuthError, AuthResult};

/// Context key carrying the client's public key
pub const CLIENT_PUBLIC_KEY: &str = "clientPublicKey";
/// Context key carrying the user's public key
pub const USER_PUBLIC_KEY: &str = "userPublicKey";
/// Context key carrying the attestant's public key
pub const ATTESTANT_PUBLIC_KEY: &str = "attestantPublicKey";
/// Context key carrying the user's proxy identifier
pub const USER_PROXY: &str = "userProxy";
/// Context key carrying a correlation token
pub const TOKEN: &str = "token";
/// Context key carrying a scope string
pub const SCOPE: &str = "scope";

/// Subject prefix of user-signed claim JWTs
pub const CLAIM_SUBJECT_PREFIX: &str = "claim for ";
/// Subject prefix of attestation retrieval JWTs
pub const RETRIEVAL_SUBJECT_PREFIX: &str = "attestation retrieval for ";

/// Decoded payload of a caller-signed JWT
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtPayload {
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    /// Issued-at, as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<Value>,
    /// Expiry, as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<Value>,
    /// Subject
    #[serde(default)]
    pub sub: String,
    /// Workflow-specific fields
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl JwtPayload {
    /// Expiry as unix seconds. Integers, floats and numeric strings are
    /// accepted; anything else is treated as absent.
    pub fn expires_at(&self) -> Option<i64> {
        match self.exp.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            _ => None,
        }
    }

    /// String field of the context, if present
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// String field of the context, or [`AuthError::MissingClaim`]
    pub fn require_context(&self, key: &'static str) -> AuthResult<&str> {
        self.context_str(key).ok_or(AuthError::MissingClaim(key))
    }

    /// Context field or the empty string
    pub fn context_or_empty(&self, key: &str) -> &str {
        self.context_str(key).unwrap_or_default()
    }

    /// Attestation category named by a subject such as `"claim for id"`,
    /// upper-cased. `None` when the subject does not carry `prefix`.
    pub fn subject_type(&self, prefix: &str) -> Option<String> {
        let rest = self.sub.trim_start().strip_prefix(prefix)?.trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_uppercase())
        }
    }
}

/// Payload of a server-minted JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerClaims {
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Workflow subject
    pub sub: String,
    /// Correlation token, server public key and copied client fields
    pub context: BTreeMap<String, String>,
}

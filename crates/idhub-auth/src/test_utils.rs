//! In-memory [`JwtService`] for tests
//!
//! Tokens are registered up front with the payload `decode` should return
//! and the key they were "signed" with. `verify` succeeds only for that key.

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::SecretString;
use std::collections::HashMap;

use crate::claims::{JwtPayload, ServerClaims, TOKEN};
use crate::client::JwtService;
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
struct Registered {
    payload: JwtPayload,
    signer: String,
}

#[derive(Debug, Default)]
struct State {
    tokens: HashMap<String, Registered>,
    encoded: Vec<ServerClaims>,
    unavailable: bool,
}

/// Deterministic stand-in for the remote JWT service
#[derive(Debug, Default)]
pub struct StaticJwtService {
    state: Mutex<State>,
}

impl StaticJwtService {
    /// Empty service; every token is unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `raw` decode to `payload` and verify against `signer_key`
    pub fn register(&self, raw: impl Into<String>, payload: JwtPayload, signer_key: impl Into<String>) {
        self.state.lock().tokens.insert(
            raw.into(),
            Registered {
                payload,
                signer: signer_key.into(),
            },
        );
    }

    /// Make every call fail with a 503
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Claims passed to `encode`, oldest first
    pub fn encoded(&self) -> Vec<ServerClaims> {
        self.state.lock().encoded.clone()
    }

    fn check_available(&self, endpoint: &str) -> AuthResult<()> {
        if self.state.lock().unavailable {
            return Err(AuthError::Status {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JwtService for StaticJwtService {
    async fn decode(&self, token: &str) -> AuthResult<JwtPayload> {
        self.check_available("decode")?;
        self.state
            .lock()
            .tokens
            .get(token)
            .map(|r| r.payload.clone())
            .ok_or_else(|| AuthError::malformed("decode response has no payload"))
    }

    async fn verify(&self, public_key: &str, token: &str) -> AuthResult<bool> {
        self.check_available("verify")?;
        Ok(self
            .state
            .lock()
            .tokens
            .get(token)
            .is_some_and(|r| r.signer == public_key))
    }

    async fn encode(
        &self,
        claims: &ServerClaims,
        _private_key: &SecretString,
    ) -> AuthResult<String> {
        self.check_available("encode")?;
        let jwt = format!(
            "server.{}.{}",
            claims.sub.replace(' ', "-"),
            claims.context.get(TOKEN).map(String::as_str).unwrap_or_default()
        );
        self.state.lock().encoded.push(claims.clone());
        Ok(jwt)
    }
}

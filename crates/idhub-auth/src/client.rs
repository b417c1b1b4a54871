//! Remote JWT service client
//!
//! All cryptography happens in an external service reached over HTTP. The
//! [`JwtService`] trait is the seam the rest of the workspace depends on;
//! [`RemoteJwtClient`] is the production implementation. Calls are single-shot:
//! no retries, no caching.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::claims::{JwtPayload, ServerClaims};
use crate::config::ApiConfig;
use crate::error::{AuthError, AuthResult};

/// Decode, verify and encode operations of the JWT service
#[async_trait]
pub trait JwtService: Send + Sync + fmt::Debug {
    /// Decode a token without checking its signature
    async fn decode(&self, token: &str) -> AuthResult<JwtPayload>;

    /// Check `token`'s signature against `public_key`
    async fn verify(&self, public_key: &str, token: &str) -> AuthResult<bool>;

    /// Sign `claims` with the server's private key
    async fn encode(&self, claims: &ServerClaims, private_key: &SecretString)
    -> AuthResult<String>;
}

#[derive(Serialize)]
struct DecodeRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct DecodeResponse {
    payload: Option<JwtPayload>,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    pubkey: &'a str,
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    payload: &'a ServerClaims,
    private_key: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    token: Option<String>,
}

/// Interpret the verify endpoint's `result` field.
///
/// The service answers with the string `"True"`; a JSON boolean is accepted
/// too. Everything else is a negative verdict.
pub fn is_affirmative(result: &Value) -> bool {
    match result {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// HTTP client for the remote JWT service
#[derive(Clone)]
pub struct RemoteJwtClient {
    endpoints: ApiConfig,
    http_client: reqwest::Client,
}

impl fmt::Debug for RemoteJwtClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteJwtClient")
            .field("endpoints", &self.endpoints)
            .field("http_client", &"<reqwest::Client>")
            .finish()
    }
}

impl RemoteJwtClient {
    /// Build a client with the configured request timeout
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ClientBuild`] if the TLS backend cannot be initialised.
    pub fn new(endpoints: ApiConfig) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .build()
            .map_err(AuthError::ClientBuild)?;
        Ok(Self {
            endpoints,
            http_client,
        })
    }

    /// Configured endpoints
    pub fn endpoints(&self) -> &ApiConfig {
        &self.endpoints
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> AuthResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(endpoint, "Calling JWT service");

        let response = self
            .http_client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|source| AuthError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AuthError::malformed(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl JwtService for RemoteJwtClient {
    async fn decode(&self, token: &str) -> AuthResult<JwtPayload> {
        let response: DecodeResponse = self
            .post(&self.endpoints.decode_jwt, &DecodeRequest { token })
            .await?;
        response
            .payload
            .ok_or_else(|| AuthError::malformed("decode response has no payload"))
    }

    async fn verify(&self, public_key: &str, token: &str) -> AuthResult<bool> {
        let response: VerifyResponse = self
            .post(
                &self.endpoints.verify_jwt,
                &VerifyRequest {
                    pubkey: public_key,
                    token,
                },
            )
            .await?;
        let verified = is_affirmative(&response.result);
        debug!(verified, "JWT signature checked");
        Ok(verified)
    }

    async fn encode(
        &self,
        claims: &ServerClaims,
        private_key: &SecretString,
    ) -> AuthResult<String> {
        let response: EncodeResponse = self
            .post(
                &self.endpoints.encode_jwt,
                &EncodeRequest {
                    payload: claims,
                    private_key: private_key.expose_secret(),
                },
            )
            .await?;
        response
            .token
            .ok_or_else(|| AuthError::malformed("encode response has no token"))
    }
}

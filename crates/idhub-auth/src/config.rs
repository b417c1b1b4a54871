//! Remote service endpoints and server signing identity

use secrecy::SecretString;
use serde::Deserialize;

/// Default request timeout for JWT service calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default lifetime of a server-issued JWT
pub const DEFAULT_LIFETIME_SECS: i64 = 300;
/// Default `iss` of server-issued JWTs
pub const DEFAULT_ISSUER: &str = "idhub.server";
/// Default `aud` of server-issued JWTs
pub const DEFAULT_AUDIENCE: &str = "idhub.user";

/// Endpoints of the remote JWT service
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// `POST {token}` → `{payload}`
    pub decode_jwt: String,
    /// `POST {pubkey, token}` → `{result}`
    pub verify_jwt: String,
    /// `POST {payload, private_key}` → `{token}`
    pub encode_jwt: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Keys and claims used when the server mints its own JWTs.
///
/// The private key is only ever forwarded to the encode endpoint; `Debug`
/// output redacts it.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerConfig {
    /// Key handed to the encode endpoint
    pub server_private_key: SecretString,
    /// Key embedded in every server JWT context
    pub server_public_key: String,
    /// `iss` claim
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// `aud` claim
    #[serde(default = "default_audience")]
    pub audience: String,
    /// `exp - iat`
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: i64,
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_lifetime_secs() -> i64 {
    DEFAULT_LIFETIME_SECS
}

impl IssuerConfig {
    /// Issuer identity with default claims
    pub fn new(server_private_key: impl Into<String>, server_public_key: impl Into<String>) -> Self {
        Self {
            server_private_key: SecretString::new(server_private_key.into()),
            server_public_key: server_public_key.into(),
            issuer: default_issuer(),
            audience: default_audience(),
            lifetime_secs: DEFAULT_LIFETIME_SECS,
        }
    }
}

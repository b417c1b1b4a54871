//! Correlation token issuance
//!
//! A client presents a JWT it signed itself. When the signature checks out
//! against the key the client declares in its own context, the server mints a
//! correlation token and wraps it in a short-lived JWT signed with the server
//! key. Nothing is persisted here; the token only reaches the ledger once a
//! user resolves it.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use idhub_types::Workflow;

use crate::claims::{CLIENT_PUBLIC_KEY, JwtPayload, SCOPE, ServerClaims, TOKEN};
use crate::client::JwtService;
use crate::config::IssuerConfig;
use crate::error::AuthResult;
use crate::token::mint_token;

/// Context key of the server public key in issued JWTs
pub const SERVER_PUBLIC_KEY: &str = "serverPublicKey";

/// Client context fields copied into the server JWT for `workflow`
pub const fn copied_fields(workflow: Workflow) -> &'static [&'static str] {
    match workflow {
        Workflow::Login => &["clientName", SCOPE],
        Workflow::Claim => &["clientName"],
        Workflow::Authorization => &["requesterName", SCOPE],
    }
}

/// A freshly issued server JWT and the correlation token it carries.
///
/// Both fields are empty when the client JWT failed verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issued {
    /// Server-signed JWT
    pub jwt: String,
    /// Correlation token embedded in the JWT context
    pub token: String,
}

impl Issued {
    /// Whether issuance was refused
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

/// Mints correlation tokens and server JWTs
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    service: Arc<dyn JwtService>,
    config: IssuerConfig,
}

impl TokenIssuer {
    /// Create an issuer backed by `service`
    pub fn new(service: Arc<dyn JwtService>, config: IssuerConfig) -> Self {
        Self { service, config }
    }

    /// Issue a token for `client_jwt` in `workflow`.
    ///
    /// # Errors
    ///
    /// Returns an error if any JWT service call fails or the client JWT has
    /// no `clientPublicKey`. A signature that does not verify yields an empty
    /// [`Issued`] instead.
    pub async fn issue(&self, client_jwt: &str, workflow: Workflow) -> AuthResult<Issued> {
        let client = self.service.decode(client_jwt).await?;
        let public_key = client.require_context(CLIENT_PUBLIC_KEY)?;

        if !self.service.verify(public_key, client_jwt).await? {
            info!(%workflow, "Client JWT failed verification, no token issued");
            return Ok(Issued::default());
        }

        let token = mint_token();
        let claims = self.server_claims(&client, workflow, &token, Utc::now().timestamp());
        let jwt = self
            .service
            .encode(&claims, &self.config.server_private_key)
            .await?;

        debug!(%workflow, "Issued correlation token");
        Ok(Issued { jwt, token })
    }

    /// Payload of the server JWT for `token`, issued at `iat`
    pub fn server_claims(
        &self,
        client: &JwtPayload,
        workflow: Workflow,
        token: &str,
        iat: i64,
    ) -> ServerClaims {
        let mut context: BTreeMap<String, String> = copied_fields(workflow)
            .iter()
            .map(|key| ((*key).to_string(), client.context_or_empty(key).to_string()))
            .collect();
        context.insert(
            SERVER_PUBLIC_KEY.to_string(),
            self.config.server_public_key.clone(),
        );
        context.insert(TOKEN.to_string(), token.to_string());

        ServerClaims {
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat,
            exp: iat + self.config.lifetime_secs,
            sub: workflow.subject().to_string(),
            context,
        }
    }
}

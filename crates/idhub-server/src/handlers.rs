//! HTTP handlers
//!
//! Every handler returns an [`Envelope`]; failures along the way land in the
//! error list rather than short-circuiting the response.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use idhub_store::UserRegistration;
use idhub_types::{ClaimRecord, NewUser, UserRecord, Workflow};

use crate::claims::{list_pending, parse_page};
use crate::envelope::{Envelope, ErrorList, JsonBody};
use crate::error::ResolutionError;
use crate::resolution::AttestationAction;
use crate::state::AppState;

/// Body of the token issuance routes
#[derive(Debug, Deserialize)]
pub struct ClientJwtRequest {
    /// Client-signed JWT
    #[serde(rename = "clientJWT")]
    pub client_jwt: String,
}

/// Body of `POST /login/jwt`
#[derive(Debug, Deserialize)]
pub struct UserJwtRequest {
    /// User-signed login JWT
    #[serde(rename = "userJWT")]
    pub user_jwt: String,
}

/// Body of `POST /authorizations/jwt`
#[derive(Debug, Deserialize)]
pub struct AuthorizationJwtRequest {
    /// User-signed authorization JWT
    #[serde(rename = "authorizationJWT")]
    pub authorization_jwt: String,
}

/// Body of `POST /claims/add`
#[derive(Debug, Deserialize)]
pub struct ClaimJwtRequest {
    /// User-signed claim JWT
    #[serde(rename = "claimJWT")]
    pub claim_jwt: String,
}

/// Body of `POST /attestations`
#[derive(Debug, Deserialize)]
pub struct AttestationJwtRequest {
    /// User-signed retrieval JWT
    #[serde(rename = "attestationJWT")]
    pub attestation_jwt: String,
}

/// Claim ids arrive as either JSON numbers or strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClaimId {
    /// `"claimID": 7`
    Number(i64),
    /// `"claimID": "7"`
    Text(String),
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> Self {
        match id {
            ClaimId::Number(n) => n.to_string(),
            ClaimId::Text(s) => s,
        }
    }
}

/// Body of `POST /attestations/add`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRequest {
    /// Attestant identity
    pub attestant: String,
    /// Attestant-signed JWT
    pub attestation: String,
    /// Target claim
    #[serde(rename = "claimID")]
    pub claim_id: ClaimId,
    /// Target claim type
    pub claim_type: String,
    /// Claimant proxy
    pub proxy: String,
    /// `APPROVED` or `REJECTED`
    pub status: String,
}

/// Query of `GET /claims`
#[derive(Debug, Default, Deserialize)]
pub struct ClaimsQuery {
    /// Requested page, 1-based
    pub page: Option<String>,
}

async fn issue(state: &AppState, client_jwt: &str, workflow: Workflow) -> Envelope {
    let mut errors = ErrorList::new();
    let issued = errors
        .record(state.issuer.issue(client_jwt, workflow).await)
        .unwrap_or_default();
    Envelope::new(errors)
        .result("JWT", issued.jwt)
        .result("token", issued.token)
}

async fn resolve(state: &AppState, workflow: Workflow, raw: &str) -> Envelope {
    let mut errors = ErrorList::new();
    let valid = state.resolver.resolve_token(workflow, raw, &mut errors).await;
    Envelope::new(errors).result("valid", valid)
}

/// `POST /login/token`
pub async fn login_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ClientJwtRequest>,
) -> Envelope {
    issue(&state, &body.client_jwt, Workflow::Login).await
}

/// `POST /login/jwt`
pub async fn login_jwt(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<UserJwtRequest>,
) -> Envelope {
    resolve(&state, Workflow::Login, &body.user_jwt).await
}

/// `POST /claims/token`
pub async fn claims_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ClientJwtRequest>,
) -> Envelope {
    issue(&state, &body.client_jwt, Workflow::Claim).await
}

fn claim_summary(claim: Option<ClaimRecord>) -> Value {
    match claim {
        Some(claim) => json!({
            "proxy": claim.proxy,
            "type": claim.claim_type,
            "status": claim.status,
            "content": claim.claim,
        }),
        None => Value::Object(Map::new()),
    }
}

/// `POST /claims/add`
pub async fn claims_add(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ClaimJwtRequest>,
) -> Envelope {
    let mut errors = ErrorList::new();
    let outcome = state.resolver.submit_claim(&body.claim_jwt, &mut errors).await;
    Envelope::new(errors)
        .result("valid", outcome.valid)
        .result("claim", claim_summary(outcome.claim))
}

/// `GET /claims?page=N`
pub async fn claims_list(
    State(state): State<AppState>,
    Query(query): Query<ClaimsQuery>,
) -> Envelope {
    let mut errors = ErrorList::new();
    let requested = parse_page(query.page.as_deref(), &mut errors);
    let listing = list_pending(state.store.as_ref(), requested, &mut errors).await;
    Envelope::new(errors)
        .top("count", listing.items.len())
        .top("currentPage", listing.page.current)
        .top("pages", listing.page.pages)
        .top("total", listing.page.total)
        .result("items", listing.items)
}

/// `POST /attestations/add`
pub async fn attestations_add(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AttestationRequest>,
) -> Envelope {
    let mut errors = ErrorList::new();
    let action = AttestationAction {
        attestant: body.attestant,
        attestation: body.attestation,
        claim_id: body.claim_id.into(),
        claim_type: body.claim_type,
        proxy: body.proxy,
        status: body.status,
    };
    let outcome = state.resolver.attest(action, &mut errors).await;

    let mut item = Map::new();
    if let Some(status) = outcome.status {
        item.insert("status".into(), status.as_str().into());
    }
    if let Some(updated) = outcome.updated {
        item.insert("updated".into(), updated.into());
    }
    if let Some((attestant, attestation)) = outcome.stored {
        item.insert("attestant".into(), attestant.into());
        item.insert("attestation".into(), attestation.into());
    }
    Envelope::new(errors)
        .top("attested", outcome.attested)
        .result("items", item)
}

/// `POST /attestations`
pub async fn attestations_get(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AttestationJwtRequest>,
) -> Envelope {
    let mut errors = ErrorList::new();
    let retrieval = state
        .resolver
        .retrieve_attestation(&body.attestation_jwt, &mut errors)
        .await;

    let mut item = Map::new();
    item.insert("status".into(), retrieval.status.into());
    if let Some(attestation) = retrieval.attestation {
        item.insert("attestation".into(), attestation.into());
    }
    Envelope::new(errors).result("items", item)
}

/// `POST /authorizations/token`
pub async fn authorizations_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ClientJwtRequest>,
) -> Envelope {
    issue(&state, &body.client_jwt, Workflow::Authorization).await
}

/// `POST /authorizations/jwt`
pub async fn authorizations_jwt(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AuthorizationJwtRequest>,
) -> Envelope {
    resolve(&state, Workflow::Authorization, &body.authorization_jwt).await
}

fn user_summary(user: &UserRecord) -> Value {
    json!({
        "userid": user.id,
        "name": user.name,
        "phone": user.phone,
        "email": user.email,
        "address": {
            "country": user.country,
            "region": user.region,
            "locality": user.locality,
            "street_address": user.street_address,
            "postal_code": user.postal_code,
        },
    })
}

/// `POST /users/add`
pub async fn users_add(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<NewUser>,
) -> Envelope {
    let mut errors = ErrorList::new();
    let mut summary = Value::Object(Map::new());

    if user.proxy.trim().is_empty() {
        errors.push(ResolutionError::MissingField("proxy"));
    } else if user.public_key.trim().is_empty() {
        errors.push(ResolutionError::MissingField("publicKey"));
    } else {
        match errors.record(state.store.register_user(user).await) {
            Some(UserRegistration::Registered(record)) => {
                tracing::info!(id = record.id, "User registered");
                summary = user_summary(&record);
            }
            Some(UserRegistration::Existing) => {
                tracing::debug!("Public key already registered");
            }
            None => {}
        }
    }
    Envelope::new(errors).result("user", summary)
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

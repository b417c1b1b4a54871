//! Shared harness for server integration tests
//!
//! Builds the full router over an in-memory ledger and a
//! [`StaticJwtService`], so every route can be driven with `oneshot`
//! and JWTs are plain labels registered with their payload and signer.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use idhub_auth::test_utils::StaticJwtService;
use idhub_auth::{ApiConfig, IssuerConfig, JwtPayload, now_unix};
use idhub_server::{AppState, IdhubConfig, build_router};
use idhub_store::SqliteStore;

pub const SERVER_PUBLIC_KEY: &str = "server-public";
pub const CLIENT_KEY: &str = "client-key";
pub const USER_KEY: &str = "user-key";
pub const ATTESTANT_KEY: &str = "attestant-key";
pub const PROXY: &str = "proxy-0001";

/// Router plus handles on its backing services
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub jwt: Arc<StaticJwtService>,
    pub store: SqliteStore,
}

impl TestApp {
    /// Fresh app with a three-attempt, 20 ms poll budget
    pub fn new() -> Self {
        Self::with_poll(3, 20)
    }

    pub fn with_poll(attempts: u32, interval_ms: u64) -> Self {
        let api = ApiConfig {
            decode_jwt: "http://jwt.invalid/decode".to_string(),
            verify_jwt: "http://jwt.invalid/verify".to_string(),
            encode_jwt: "http://jwt.invalid/encode".to_string(),
            timeout_secs: 1,
        };
        let mut config = IdhubConfig::new(api, IssuerConfig::new("server-private", SERVER_PUBLIC_KEY));
        config.poll.attempts = attempts;
        config.poll.interval_ms = interval_ms;

        let jwt = Arc::new(StaticJwtService::new());
        let store = SqliteStore::open_in_memory().expect("in-memory ledger");
        let state = AppState::new(&config, Arc::new(store.clone()), jwt.clone());
        let router = build_router(state.clone());
        Self {
            router,
            state,
            jwt,
            store,
        }
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_headers(&self, uri: &str) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("origin", "http://wallet.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Register a client JWT signed with [`CLIENT_KEY`]
    pub fn client_jwt(&self, raw: &str, context: Value) -> String {
        let mut context = as_map(context);
        context.insert("clientPublicKey".into(), CLIENT_KEY.into());
        self.jwt.register(raw, payload("client request", context, 600), CLIENT_KEY);
        raw.to_string()
    }

    /// Register a user JWT signed with [`USER_KEY`]
    pub fn user_jwt(&self, raw: &str, sub: &str, context: Value, exp_offset: i64) -> String {
        let mut context = as_map(context);
        context.insert("userPublicKey".into(), USER_KEY.into());
        context
            .entry("userProxy")
            .or_insert_with(|| PROXY.into());
        self.jwt.register(raw, payload(sub, context, exp_offset), USER_KEY);
        raw.to_string()
    }

    /// Register an attestation JWT signed with [`ATTESTANT_KEY`]
    pub fn attestant_jwt(&self, raw: &str) -> String {
        let mut context = Map::new();
        context.insert("attestantPublicKey".into(), ATTESTANT_KEY.into());
        self.jwt
            .register(raw, payload("attestation", context, 600), ATTESTANT_KEY);
        raw.to_string()
    }

    /// Submit a valid ID claim and return its id
    pub async fn submit_id_claim(&self, raw: &str) -> i64 {
        self.user_jwt(raw, "claim for id", json!({}), 600);
        let (_, body) = self.post("/api/v1/claims/add", json!({"claimJWT": raw})).await;
        assert_eq!(body["result"]["valid"], json!(true), "{body}");
        // out-of-range pages clamp to the last one, where the newest claim sits
        let (_, last) = self.get("/api/v1/claims?page=1000").await;
        last["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|item| item["claim"] == json!(raw))
            .and_then(|item| item["claimID"].as_i64())
            .expect("claim listed")
    }
}

pub fn payload(sub: &str, context: Map<String, Value>, exp_offset: i64) -> JwtPayload {
    let now = now_unix();
    JwtPayload {
        iss: Some("test".to_string()),
        aud: None,
        iat: Some(json!(now)),
        exp: Some(json!(now + exp_offset)),
        sub: sub.to_string(),
        context,
    }
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

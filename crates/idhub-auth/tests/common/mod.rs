//! Common test utilities for integration tests
//!
//! A wiremock stand-in for the remote JWT service with helpers to script its
//! decode / verify / encode answers.

#![allow(dead_code)]

use idhub_auth::{ApiConfig, RemoteJwtClient};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

/// Mock JWT service
pub struct MockJwtServer {
    pub server: MockServer,
}

impl MockJwtServer {
    /// Start a new mock JWT service
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoint configuration pointing at this server
    pub fn api_config(&self) -> ApiConfig {
        let base = self.server.uri();
        ApiConfig {
            decode_jwt: format!("{base}/decode"),
            verify_jwt: format!("{base}/verify"),
            encode_jwt: format!("{base}/encode"),
            timeout_secs: 5,
        }
    }

    /// Remote client wired to this server
    pub fn client(&self) -> RemoteJwtClient {
        RemoteJwtClient::new(self.api_config()).expect("client builds")
    }

    /// `decode {token}` answers `{payload}`
    pub async fn mock_decode(&self, token: &str, payload: Value) {
        Mock::given(method("POST"))
            .and(path("/decode"))
            .and(body_partial_json(json!({ "token": token })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "payload": payload })))
            .mount(&self.server)
            .await;
    }

    /// `verify {pubkey, token}` answers `{result}`
    pub async fn mock_verify(&self, pubkey: &str, token: &str, result: Value) {
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_partial_json(json!({ "pubkey": pubkey, "token": token })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.server)
            .await;
    }

    /// `encode` answers `{token: jwt}` for any payload
    pub async fn mock_encode(&self, jwt: &str) {
        Mock::given(method("POST"))
            .and(path("/encode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": jwt })))
            .mount(&self.server)
            .await;
    }

    /// `endpoint` answers with `status` and a plain-text body
    pub async fn mock_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string("service error"))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies received on `endpoint`, oldest first
    pub async fn bodies(&self, endpoint: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == endpoint)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}

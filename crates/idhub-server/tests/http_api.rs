//! Route-level tests driven through the full router

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use common::{PROXY, SERVER_PUBLIC_KEY, TestApp};
use idhub_auth::claims::JwtPayload;
use idhub_store::LedgerStore;

#[tokio::test]
async fn test_login_token_issued_for_verified_client() {
    let app = TestApp::new();
    let jwt = app.client_jwt("client-1", json!({"clientName": "Shop", "scope": "name,email"}));

    let (status, body) = app.post("/api/v1/login/token", json!({"clientJWT": jwt})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("error").is_none(), "{body}");

    let token = body["result"]["token"].as_str().unwrap();
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    assert_eq!(body["result"]["JWT"], json!(format!("server.login-token.{token}")));

    let encoded = app.jwt.encoded();
    assert_eq!(encoded.len(), 1);
    let claims = &encoded[0];
    assert_eq!(claims.sub, "login token");
    assert_eq!(claims.exp - claims.iat, 300);
    assert_eq!(claims.context["clientName"], "Shop");
    assert_eq!(claims.context["scope"], "name,email");
    assert_eq!(claims.context["serverPublicKey"], SERVER_PUBLIC_KEY);
    assert_eq!(claims.context["token"], token);

    // issuance alone does not touch the ledger
    assert!(app.store.find_token(token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_issued_tokens_are_distinct() {
    let app = TestApp::new();
    let jwt = app.client_jwt("client-1", json!({"clientName": "Shop", "scope": "name"}));

    let (_, first) = app.post("/api/v1/login/token", json!({"clientJWT": jwt})).await;
    let (_, second) = app.post("/api/v1/login/token", json!({"clientJWT": jwt})).await;
    assert_ne!(first["result"]["token"], second["result"]["token"]);
}

#[tokio::test]
async fn test_unverified_client_gets_empty_token() {
    let app = TestApp::new();
    let mut context = serde_json::Map::new();
    context.insert("clientPublicKey".into(), "claimed-key".into());
    app.jwt
        .register("forged", common::payload("client request", context, 600), "other-key");

    let (status, body) = app.post("/api/v1/claims/token", json!({"clientJWT": "forged"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": {"JWT": "", "token": ""}}));
    assert!(app.jwt.encoded().is_empty());
}

#[tokio::test]
async fn test_authorization_token_copies_requester() {
    let app = TestApp::new();
    let jwt = app.client_jwt(
        "client-2",
        json!({"requesterName": "Bank", "scope": "phone", "clientName": "ignored"}),
    );

    let (_, body) = app
        .post("/api/v1/authorizations/token", json!({"clientJWT": jwt}))
        .await;
    let token = body["result"]["token"].as_str().unwrap();
    assert_eq!(body["result"]["JWT"], json!(format!("server.authorization-request.{token}")));

    let claims = &app.jwt.encoded()[0];
    assert_eq!(claims.context["requesterName"], "Bank");
    assert_eq!(claims.context["scope"], "phone");
    assert!(!claims.context.contains_key("clientName"));
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.post_raw("/api/v1/login/token", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"].as_array().map(Vec::len), Some(1));
    assert!(body.get("result").is_none());

    let (status, body) = app.post("/api/v1/login/jwt", json!({"wrong": "field"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_array());
}

#[tokio::test]
async fn test_login_jwt_records_valid_resolution() {
    let app = TestApp::new();
    let jwt = app.user_jwt("user-1", "login", json!({"token": "T1", "scope": "name"}), 600);

    let (_, body) = app.post("/api/v1/login/jwt", json!({"userJWT": jwt})).await;
    assert_eq!(body, json!({"result": {"valid": true}}));

    let record = app.store.find_token("T1").await.unwrap().unwrap();
    assert!(record.valid);
    assert_eq!(record.proxy, PROXY);
    assert_eq!(record.scope, "name");
}

#[tokio::test]
async fn test_expired_login_jwt_is_recorded_invalid() {
    let app = TestApp::new();
    let jwt = app.user_jwt("user-old", "login", json!({"token": "T2", "scope": "name"}), -10);

    let (_, body) = app.post("/api/v1/login/jwt", json!({"userJWT": jwt})).await;
    assert_eq!(body, json!({"result": {"valid": false}}));

    let record = app.store.find_token("T2").await.unwrap().unwrap();
    assert!(!record.valid);
    assert_eq!(record.scope, "name");
}

#[tokio::test]
async fn test_missing_expiry_counts_as_expired() {
    let app = TestApp::new();
    let mut context = serde_json::Map::new();
    context.insert("userPublicKey".into(), common::USER_KEY.into());
    context.insert("userProxy".into(), PROXY.into());
    context.insert("token".into(), "T3".into());
    context.insert("scope".into(), "email".into());
    app.jwt.register(
        "no-exp",
        JwtPayload {
            sub: "authorization".to_string(),
            context,
            ..Default::default()
        },
        common::USER_KEY,
    );

    let (_, body) = app
        .post("/api/v1/authorizations/jwt", json!({"authorizationJWT": "no-exp"}))
        .await;
    assert_eq!(body["result"]["valid"], json!(false));
}

#[tokio::test]
async fn test_undecodable_user_jwt_reports_error() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/v1/login/jwt", json!({"userJWT": "unknown"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"].as_array().map(Vec::len), Some(1));
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn test_claim_submission_and_duplicate() {
    let app = TestApp::new();
    let jwt = app.user_jwt("claim-1", "claim for id", json!({}), 600);

    let (_, body) = app.post("/api/v1/claims/add", json!({"claimJWT": jwt})).await;
    assert_eq!(
        body,
        json!({"result": {
            "valid": true,
            "claim": {"proxy": PROXY, "type": "ID", "status": "PENDING", "content": "claim-1"},
        }})
    );

    let (_, body) = app.post("/api/v1/claims/add", json!({"claimJWT": jwt})).await;
    assert_eq!(body, json!({"error": ["Claim existed."]}));
}

#[tokio::test]
async fn test_claim_with_token_resolves_it() {
    let app = TestApp::new();
    let jwt = app.user_jwt("claim-t", "claim for Degree", json!({"token": "CT1"}), 600);

    let (_, body) = app.post("/api/v1/claims/add", json!({"claimJWT": jwt})).await;
    assert_eq!(body["result"]["claim"]["type"], json!("DEGREE"));

    let record = app.store.find_token("CT1").await.unwrap().unwrap();
    assert!(record.valid);
    assert_eq!(record.scope, "DEGREE");
}

#[tokio::test]
async fn test_invalid_claim_is_not_stored() {
    let app = TestApp::new();
    let jwt = app.user_jwt("claim-old", "claim for id", json!({}), -1);

    let (_, body) = app.post("/api/v1/claims/add", json!({"claimJWT": jwt})).await;
    assert_eq!(body, json!({"result": {"valid": false, "claim": {}}}));

    let (_, listing) = app.get("/api/v1/claims").await;
    assert_eq!(listing["total"], json!(0));
}

#[tokio::test]
async fn test_claims_listing_pages() {
    let app = TestApp::new();
    for n in 0..12 {
        let jwt = app.user_jwt(&format!("claim-{n:02}"), "claim for id", json!({}), 600);
        app.post("/api/v1/claims/add", json!({"claimJWT": jwt})).await;
    }
    // other claim types are not listed
    let other = app.user_jwt("degree", "claim for degree", json!({}), 600);
    app.post("/api/v1/claims/add", json!({"claimJWT": other})).await;

    let (_, body) = app.get("/api/v1/claims?page=1").await;
    assert_eq!(body["count"], json!(5));
    assert_eq!(body["currentPage"], json!(1));
    assert_eq!(body["pages"], json!(3));
    assert_eq!(body["total"], json!(12));
    let first = &body["items"][0];
    assert_eq!(first["claim"], json!("claim-00"));
    assert_eq!(first["status"], json!("PENDING"));
    assert!(first["claimID"].is_i64());
    assert!(first["created"].is_string());

    let (_, body) = app.get("/api/v1/claims?page=5").await;
    assert_eq!(body["currentPage"], json!(3));
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["items"][1]["claim"], json!("claim-11"));

    let (_, body) = app.get("/api/v1/claims?page=0").await;
    assert_eq!(body["currentPage"], json!(1));

    let (_, body) = app.get("/api/v1/claims?page=abc").await;
    assert_eq!(body["error"], json!(["Invalid page: abc"]));
    assert_eq!(body["currentPage"], json!(1));
    assert_eq!(body["pages"], json!(3));
    assert!(body.get("items").is_none());
}

#[tokio::test]
async fn test_empty_claims_listing() {
    let app = TestApp::new();

    let (_, body) = app.get("/api/v1/claims").await;
    assert_eq!(
        body,
        json!({"count": 0, "currentPage": 0, "pages": 0, "total": 0, "items": []})
    );
}

fn attestation_body(attestation: &str, claim_id: Value, status: &str) -> Value {
    json!({
        "attestant": "Registry",
        "attestation": attestation,
        "claimID": claim_id,
        "claimType": "id",
        "proxy": PROXY,
        "status": status,
    })
}

#[tokio::test]
async fn test_attestation_approves_claim() {
    let app = TestApp::new();
    let claim_id = app.submit_id_claim("claim-a").await;
    let attestation = app.attestant_jwt("att-1");

    let (_, body) = app
        .post(
            "/api/v1/attestations/add",
            attestation_body(&attestation, json!(claim_id), "APPROVED"),
        )
        .await;
    assert_eq!(body["attested"], json!(true));
    assert_eq!(body["items"]["status"], json!("APPROVED"));
    assert_eq!(body["items"]["attestant"], json!("Registry"));
    assert_eq!(body["items"]["attestation"], json!("att-1"));
    assert!(body["items"]["updated"].is_string());

    // approved claims leave the pending list
    let (_, listing) = app.get("/api/v1/claims").await;
    assert_eq!(listing["total"], json!(0));

    let retrieval = app.user_jwt("ret-1", "attestation retrieval for id", json!({}), 600);
    let (_, body) = app
        .post("/api/v1/attestations", json!({"attestationJWT": retrieval}))
        .await;
    assert_eq!(body, json!({"items": {"status": "APPROVED", "attestation": "att-1"}}));
}

#[tokio::test]
async fn test_attestation_claim_id_may_be_string() {
    let app = TestApp::new();
    let claim_id = app.submit_id_claim("claim-s").await;
    let attestation = app.attestant_jwt("att-s");

    let (_, body) = app
        .post(
            "/api/v1/attestations/add",
            attestation_body(&attestation, json!(claim_id.to_string()), "APPROVED"),
        )
        .await;
    assert_eq!(body["attested"], json!(true));
}

#[tokio::test]
async fn test_rejection_by_new_attestant_writes_no_attestation() {
    let app = TestApp::new();
    let claim_id = app.submit_id_claim("claim-r").await;
    let attestation = app.attestant_jwt("att-r");

    let (_, body) = app
        .post(
            "/api/v1/attestations/add",
            attestation_body(&attestation, json!(claim_id), "REJECTED"),
        )
        .await;
    assert_eq!(body["attested"], json!(true));
    assert_eq!(body["items"]["status"], json!("REJECTED"));
    assert!(body["items"].get("attestant").is_none());

    let retrieval = app.user_jwt("ret-r", "attestation retrieval for id", json!({}), 600);
    let (_, body) = app
        .post("/api/v1/attestations", json!({"attestationJWT": retrieval}))
        .await;
    assert_eq!(body, json!({"items": {"status": "REJECTED"}}));
}

#[tokio::test]
async fn test_attestation_for_unknown_claim() {
    let app = TestApp::new();
    let attestation = app.attestant_jwt("att-x");

    let (_, body) = app
        .post(
            "/api/v1/attestations/add",
            attestation_body(&attestation, json!("999"), "APPROVED"),
        )
        .await;
    assert_eq!(body, json!({"attested": false, "error": ["Claim not found."]}));
}

#[tokio::test]
async fn test_attestation_with_bad_status() {
    let app = TestApp::new();
    let claim_id = app.submit_id_claim("claim-b").await;
    let attestation = app.attestant_jwt("att-b");

    let (_, body) = app
        .post(
            "/api/v1/attestations/add",
            attestation_body(&attestation, json!(claim_id), "PENDING"),
        )
        .await;
    assert_eq!(body["attested"], json!(false));
    assert_eq!(body["error"], json!(["Invalid attestation status: PENDING"]));
}

#[tokio::test]
async fn test_retrieval_without_claim_reports_error_status() {
    let app = TestApp::new();
    let retrieval = app.user_jwt("ret-none", "attestation retrieval for id", json!({}), 600);

    let (_, body) = app
        .post("/api/v1/attestations", json!({"attestationJWT": retrieval}))
        .await;
    assert_eq!(body, json!({"items": {"status": "ERROR"}}));
}

#[tokio::test]
async fn test_user_registration() {
    let app = TestApp::new();
    let user = json!({
        "proxy": PROXY,
        "publicKey": common::USER_KEY,
        "name": "Ada",
        "email": "ada@example.com",
        "phone": "555-0100",
        "country": "UK",
        "locality": "London",
        "postal_code": "N1",
    });

    let (_, body) = app.post("/api/v1/users/add", user.clone()).await;
    let registered = &body["result"]["user"];
    assert!(registered["userid"].is_i64());
    assert_eq!(registered["name"], json!("Ada"));
    assert_eq!(registered["email"], json!("ada@example.com"));
    assert_eq!(registered["address"]["country"], json!("UK"));
    assert_eq!(registered["address"]["postal_code"], json!("N1"));
    assert_eq!(registered["address"]["region"], json!(""));

    let stored = app.store.find_user(PROXY).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ada");

    // same public key again writes nothing
    let (_, body) = app.post("/api/v1/users/add", user).await;
    assert_eq!(body, json!({"result": {"user": {}}}));
}

#[tokio::test]
async fn test_user_registration_requires_keys() {
    let app = TestApp::new();

    let (_, body) = app
        .post("/api/v1/users/add", json!({"proxy": "", "publicKey": "k"}))
        .await;
    assert_eq!(body, json!({"error": ["Missing required field: proxy"]}));

    let (status, _) = app.post("/api/v1/users/add", json!({"name": "nobody"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_cors() {
    let app = TestApp::new();

    let (status, headers, body) = app.get_with_headers("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["version"], json!(idhub_server::VERSION));
    assert_eq!(headers["access-control-allow-origin"], "*");

    let (_, headers, _) = app.get_with_headers("/api/v1/claims").await;
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_jwt_service_outage_is_reported() {
    let app = TestApp::new();
    let jwt = app.client_jwt("client-1", json!({"clientName": "Shop", "scope": "name"}));
    app.jwt.set_unavailable(true);

    let (status, body) = app.post("/api/v1/login/token", json!({"clientJWT": jwt})).await;
    assert_eq!(status, StatusCode::OK);
    let errors = body["error"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().contains("503"));
    assert!(body.get("result").is_none());
}

//! Poll/push resolver
//!
//! A push caller hands over a correlation token and waits until some user
//! resolves it. The ledger is read up to `attempts` times with `interval`
//! between reads; the wait is a timer sleep on the caller's task, so
//! dropping the future stops polling.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use idhub_store::LedgerStore;
use idhub_types::{ATTESTATION_SCOPE, Scope, TokenRecord};

use crate::config::PollConfig;
use crate::envelope::ErrorList;

/// Result of one poll: the `result` object plus any errors hit on the way
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    /// `{scope, ...}`
    pub result: Map<String, Value>,
    /// Collected failures
    pub errors: ErrorList,
}

impl PollOutcome {
    /// `{"result": {...}}`, with an `error` list alongside when non-empty
    pub fn to_value(&self) -> Value {
        let mut body = Map::new();
        body.insert("result".to_string(), Value::Object(self.result.clone()));
        if !self.errors.is_empty() {
            body.insert("error".to_string(), Value::from(self.errors.messages().to_vec()));
        }
        Value::Object(body)
    }

    /// Granted scope, empty if the token was never resolved
    pub fn scope(&self) -> &str {
        self.result
            .get("scope")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Waits for token resolutions and assembles scoped results
#[derive(Debug, Clone)]
pub struct PollResolver {
    store: Arc<dyn LedgerStore>,
    attempts: u32,
    interval: Duration,
}

impl PollResolver {
    /// Create a resolver with the given budget
    pub fn new(store: Arc<dyn LedgerStore>, config: &PollConfig) -> Self {
        Self {
            store,
            attempts: config.attempts.max(1),
            interval: config.interval(),
        }
    }

    /// Read the ledger until `token` carries a scope or the budget runs out.
    ///
    /// A store error ends polling.
    pub async fn wait_for(&self, token: &str, errors: &mut ErrorList) -> Option<TokenRecord> {
        for attempt in 1..=self.attempts {
            match self.store.find_token(token).await {
                Ok(Some(record)) if record.is_resolved() => {
                    debug!(attempt, "Token resolution found");
                    return Some(record);
                }
                Ok(_) => {}
                Err(e) => {
                    errors.push(e);
                    return None;
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        debug!(attempts = self.attempts, "Poll budget exhausted");
        None
    }

    /// Wait for `token` and build its result
    pub async fn resolve(&self, token: &str) -> PollOutcome {
        let mut errors = ErrorList::new();
        let mut result = Map::new();
        let mut scope = String::new();

        if let Some(record) = self.wait_for(token, &mut errors).await {
            scope = record.scope.clone();
            if record.valid {
                if Scope::is_attestation_request(&record.scope) {
                    let data = self.attestation_data(&record.proxy, &mut errors).await;
                    result.insert(ATTESTATION_SCOPE.to_string(), Value::Object(data));
                } else {
                    let data = self.user_data(&record.proxy, &record.scope, &mut errors).await;
                    result.insert("user".to_string(), Value::Object(data));
                    result.insert("login".to_string(), Value::Bool(true));
                }
            }
        }

        result.insert("scope".to_string(), Value::String(scope));
        PollOutcome { result, errors }
    }

    /// Latest attestation of the proxy's most recent approved ID claim
    async fn attestation_data(&self, proxy: &str, errors: &mut ErrorList) -> Map<String, Value> {
        let mut data = Map::new();
        let Some(claim) = errors
            .record(self.store.latest_approved_claim(proxy, ATTESTATION_SCOPE).await)
            .flatten()
        else {
            return data;
        };
        if let Some(attestation) = errors
            .record(self.store.latest_attestation(claim.id).await)
            .flatten()
        {
            data.insert("attestant".into(), attestation.attestant.into());
            data.insert("attestation".into(), attestation.attestation.into());
            data.insert("created".into(), attestation.created.into());
        }
        data
    }

    /// Profile fields of `proxy` granted by `scope`
    async fn user_data(
        &self,
        proxy: &str,
        scope: &str,
        errors: &mut ErrorList,
    ) -> Map<String, Value> {
        let mut data = Map::new();
        let Some(user) = errors.record(self.store.find_user(proxy).await).flatten() else {
            return data;
        };
        for field in Scope::parse(scope).iter() {
            data.insert(field.keyword().to_string(), user.field(field).into());
        }
        data
    }
}

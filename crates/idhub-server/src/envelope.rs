//! Response envelope
//!
//! Handlers collect failures into an [`ErrorList`] and keep going. The
//! [`Envelope`] then decides the response shape:
//!
//! - errors present: `{..top-level fields, "error": [...]}` and the `result`
//!   object is dropped
//! - no errors: an `items` entry of the result is promoted to the top level;
//!   any remaining result fields stay under `result`

use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Per-request list of error messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<String>);

impl ErrorList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error and log it
    pub fn push(&mut self, error: impl fmt::Display) {
        let message = error.to_string();
        warn!(error = %message, "Request error");
        self.0.push(message);
    }

    /// Unwrap `result`, recording the error if there is one
    pub fn record<T, E: fmt::Display>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    /// No errors recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Recorded messages, oldest first
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// JSON response body under construction
#[derive(Debug)]
pub struct Envelope {
    status: StatusCode,
    errors: ErrorList,
    result: Map<String, Value>,
    top: Map<String, Value>,
}

impl Envelope {
    /// Envelope carrying `errors`
    pub fn new(errors: ErrorList) -> Self {
        Self {
            status: StatusCode::OK,
            errors,
            result: Map::new(),
            top: Map::new(),
        }
    }

    /// Set a field of the `result` object
    pub fn result(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.result.insert(key.to_string(), value);
            }
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Set a top-level field, kept even when errors are present
    pub fn top(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.top.insert(key.to_string(), value);
            }
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Override the HTTP status
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Final JSON body
    pub fn render(self) -> Value {
        let mut body = self.top;
        if !self.errors.is_empty() {
            body.insert("error".to_string(), Value::from(self.errors.0));
            return Value::Object(body);
        }
        let mut result = self.result;
        if let Some(items) = result.remove("items") {
            body.insert("items".to_string(), items);
        }
        if !result.is_empty() {
            body.insert("result".to_string(), Value::Object(result));
        }
        Value::Object(body)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.render())).into_response()
    }
}

/// JSON request body whose rejection is an error envelope with status 400
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Envelope;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let mut errors = ErrorList::new();
                errors.push(rejection.body_text());
                Err(Envelope::new(errors).status(StatusCode::BAD_REQUEST))
            }
        }
    }
}

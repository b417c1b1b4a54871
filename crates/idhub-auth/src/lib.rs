//! # IDHub Auth
//!
//! Token issuance and JWT verification for the IDHub correlation-token
//! service.
//!
//! All signing and signature checks are delegated to a remote JWT service
//! behind the [`JwtService`] trait. This crate adds what sits around those
//! calls:
//!
//! - **[`RemoteJwtClient`]**: `reqwest` client for the decode / verify /
//!   encode endpoints
//! - **[`JwtPayload`]**, **[`ServerClaims`]**: decoded and outgoing payloads
//! - **[`Verdict`]**: `valid = verified && !expired`
//! - **[`TokenIssuer`]**: mints correlation tokens wrapped in server JWTs
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use idhub_auth::{ApiConfig, IssuerConfig, RemoteJwtClient, TokenIssuer};
//! use idhub_types::Workflow;
//!
//! # async fn example() -> Result<(), idhub_auth::AuthError> {
//! let client = RemoteJwtClient::new(ApiConfig {
//!     decode_jwt: "http://jwt.local/decode".into(),
//!     verify_jwt: "http://jwt.local/verify".into(),
//!     encode_jwt: "http://jwt.local/encode".into(),
//!     timeout_secs: 10,
//! })?;
//! let issuer = TokenIssuer::new(Arc::new(client), IssuerConfig::new("priv", "pub"));
//!
//! let issued = issuer.issue("eyJ...", Workflow::Login).await?;
//! if issued.is_empty() {
//!     println!("client JWT rejected");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `test-utils`: [`test_utils::StaticJwtService`], an in-memory service
//!   double for downstream tests

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod issuance;
pub mod token;
pub mod verdict;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use claims::{JwtPayload, ServerClaims};
pub use client::{JwtService, RemoteJwtClient};
pub use config::{ApiConfig, IssuerConfig};
pub use error::{AuthError, AuthResult};
pub use issuance::{Issued, TokenIssuer};
pub use token::mint_token;
pub use verdict::{Verdict, evaluate, is_expired, now_unix};

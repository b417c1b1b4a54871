//! # IDHub Store
//!
//! Persistent ledgers for the IDHub correlation-token service:
//!
//! - **tokens**: one row per correlation token, overwritten on every
//!   resolution
//! - **claims**: typed assertions awaiting attestation, unique per
//!   `(proxy, type, content)`
//! - **attestations**: one row per `(claim, attestant)`
//! - **users**: profiles keyed by proxy
//!
//! [`LedgerStore`] is the seam; [`SqliteStore`] is the only implementation.
//!
//! ```rust,no_run
//! use idhub_store::{LedgerStore, SqliteStore};
//!
//! # async fn example() -> Result<(), idhub_store::StoreError> {
//! let store = SqliteStore::open("data/idhub.db")?;
//! if let Some(record) = store.find_token("8QK1...").await? {
//!     println!("resolved: {}", record.is_resolved());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
pub use store::{
    AttestationWrite, Attested, ClaimSubmission, ClaimTarget, LedgerStore, UserRegistration,
};

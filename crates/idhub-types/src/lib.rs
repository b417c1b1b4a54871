//! # IDHub Types
//!
//! Shared types for the IDHub correlation-token service.
//!
//! - **Records**: `TokenRecord`, `ClaimRecord`, `AttestationRecord`, `UserRecord`
//! - **Claim lifecycle**: `ClaimStatus` (`PENDING` → `APPROVED` | `REJECTED`)
//! - **Scope**: `Scope`, a keyword set selecting which profile fields a
//!   resolution grants
//! - **Workflows**: `Workflow` (login, claim, authorization)
//!
//! Every other crate in the workspace depends on these definitions, so they
//! carry no I/O and no async code.
//!
//! ## Quick Start
//!
//! ```rust
//! use idhub_types::{Scope, ScopeField, Workflow};
//!
//! let scope = Scope::parse("name,email");
//! assert!(scope.contains(ScopeField::Name));
//! assert!(!scope.contains(ScopeField::Phone));
//!
//! assert_eq!(Workflow::Login.subject(), "login token");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod records;
pub mod scope;
pub mod time;
pub mod workflow;

pub use records::*;
pub use scope::{ATTESTATION_SCOPE, Scope, ScopeField};
pub use time::{TIMESTAMP_FORMAT, now_timestamp};
pub use workflow::Workflow;

/// Version of the IDHub types crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

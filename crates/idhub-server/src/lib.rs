//! # IDHub Server
//!
//! HTTP and WebSocket front end of the IDHub correlation-token service.
//!
//! A client asks for a correlation token (`/login/token`, `/claims/token`,
//! `/authorizations/token`), hands the server-signed JWT to a user out of
//! band, and waits on `/api/v1/socket` while the user resolves it by posting
//! a JWT signed with their own key. Claims submitted by users are listed for
//! attestants, who approve or reject them.
//!
//! ## Response envelope
//!
//! Handlers never fail outright. Errors accumulate per request and replace
//! the `result` object with an `error` list; see [`envelope`].
//!
//! ## Running
//!
//! ```bash
//! idhub-server --config cfg.json --port 8080
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod poll;
pub mod resolution;
pub mod router;
pub mod state;
pub mod websocket;

pub use cli::Cli;
pub use config::{ConfigError, IdhubConfig};
pub use envelope::{Envelope, ErrorList};
pub use error::ResolutionError;
pub use poll::{PollOutcome, PollResolver};
pub use resolution::Resolver;
pub use router::{API_PREFIX, build_router};
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

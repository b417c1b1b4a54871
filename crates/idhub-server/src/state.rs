//! Shared per-process state handed to every handler

use std::sync::Arc;

use idhub_auth::{JwtService, TokenIssuer};
use idhub_store::LedgerStore;

use crate::config::IdhubConfig;
use crate::poll::PollResolver;
use crate::resolution::Resolver;

/// Application state, cheap to clone
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger handle
    pub store: Arc<dyn LedgerStore>,
    /// Correlation token issuer
    pub issuer: TokenIssuer,
    /// Resolution flows
    pub resolver: Resolver,
    /// Push-side poller
    pub poller: PollResolver,
}

impl AppState {
    /// Wire the services together from the loaded configuration
    pub fn new(
        config: &IdhubConfig,
        store: Arc<dyn LedgerStore>,
        jwt: Arc<dyn JwtService>,
    ) -> Self {
        let issuer = TokenIssuer::new(Arc::clone(&jwt), config.jwt.clone());
        let resolver = Resolver::new(jwt, Arc::clone(&store));
        let poller = PollResolver::new(Arc::clone(&store), &config.poll);
        Self {
            store,
            issuer,
            resolver,
            poller,
        }
    }
}

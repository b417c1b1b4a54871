//! Workflow kinds mediated by correlation tokens

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three asynchronous workflows a correlation token can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    /// A client asks a user to log in and share profile fields
    Login,
    /// A user submits a claim for third-party attestation
    Claim,
    /// A requester asks a user to authorize access to profile fields
    Authorization,
}

impl Workflow {
    /// Every workflow, in route order
    pub const ALL: [Workflow; 3] = [Workflow::Login, Workflow::Claim, Workflow::Authorization];

    /// The `sub` claim of the server JWT minted for this workflow
    pub const fn subject(self) -> &'static str {
        match self {
            Self::Login => "login token",
            Self::Claim => "claim token",
            Self::Authorization => "authorization request",
        }
    }

    /// Short lowercase name, used in logs and routes
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Claim => "claim",
            Self::Authorization => "authorization",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

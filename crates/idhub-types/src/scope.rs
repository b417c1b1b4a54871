//! Scope keyword sets
//!
//! A scope is carried on the wire as a free-form string such as
//! `"name,email"` or `"name email phone"`. It is parsed into a set of
//! recognized [`ScopeField`] keywords by exact match: `"emailaddress"` grants
//! neither `email` nor `address`. Unknown keywords are ignored, not rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Scope value that redirects a resolution to attestation data
/// instead of profile fields.
pub const ATTESTATION_SCOPE: &str = "ID";

/// A user profile field that a scope can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScopeField {
    /// Blockchain address
    #[serde(rename = "address")]
    Address,
    /// Proxy controller
    #[serde(rename = "controller")]
    Controller,
    /// Registration timestamp
    #[serde(rename = "created")]
    Created,
    /// Free-text description
    #[serde(rename = "description")]
    Description,
    /// Email address
    #[serde(rename = "email")]
    Email,
    /// Identity document number
    #[serde(rename = "ID")]
    Id,
    /// IPFS pointer
    #[serde(rename = "ipfs")]
    Ipfs,
    /// Display name
    #[serde(rename = "name")]
    Name,
    /// Phone number
    #[serde(rename = "phone")]
    Phone,
    /// Proxy identifier
    #[serde(rename = "proxy")]
    Proxy,
    /// Public key
    #[serde(rename = "publicKey")]
    PublicKey,
    /// Proxy recovery account
    #[serde(rename = "recovery")]
    Recovery,
    /// Last update timestamp
    #[serde(rename = "updated")]
    Updated,
}

impl ScopeField {
    /// Every recognized field
    pub const ALL: [ScopeField; 13] = [
        Self::Address,
        Self::Controller,
        Self::Created,
        Self::Description,
        Self::Email,
        Self::Id,
        Self::Ipfs,
        Self::Name,
        Self::Phone,
        Self::Proxy,
        Self::PublicKey,
        Self::Recovery,
        Self::Updated,
    ];

    /// Wire keyword, also the key used in poll results
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Controller => "controller",
            Self::Created => "created",
            Self::Description => "description",
            Self::Email => "email",
            Self::Id => "ID",
            Self::Ipfs => "ipfs",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Proxy => "proxy",
            Self::PublicKey => "publicKey",
            Self::Recovery => "recovery",
            Self::Updated => "updated",
        }
    }

    /// Look up a field by its exact keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.keyword() == keyword)
    }
}

impl fmt::Display for ScopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Set of profile fields granted by a resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    fields: BTreeSet<ScopeField>,
}

impl Scope {
    /// Parse a raw scope string. Keywords are separated by commas and/or
    /// whitespace; unrecognized keywords are skipped.
    pub fn parse(raw: &str) -> Self {
        let fields = raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|k| !k.is_empty())
            .filter_map(ScopeField::from_keyword)
            .collect();
        Self { fields }
    }

    /// Whether `raw` asks for attestation data rather than profile fields
    pub fn is_attestation_request(raw: &str) -> bool {
        raw.trim() == ATTESTATION_SCOPE
    }

    /// Whether the scope grants `field`
    pub fn contains(&self, field: ScopeField) -> bool {
        self.fields.contains(&field)
    }

    /// Granted fields in keyword order
    pub fn iter(&self) -> impl Iterator<Item = ScopeField> + '_ {
        self.fields.iter().copied()
    }

    /// Number of granted fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no recognized field is granted
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromStr for Scope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl FromIterator<ScopeField> for Scope {
    fn from_iter<I: IntoIterator<Item = ScopeField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in &self.fields {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(field.keyword())?;
            first = false;
        }
        Ok(())
    }
}

//! Pending-claim listing for attestants

use serde::Serialize;

use idhub_store::LedgerStore;
use idhub_types::{ATTESTATION_SCOPE, ClaimRecord, ClaimStatus};

use crate::envelope::ErrorList;
use crate::error::ResolutionError;

/// Claims per page
pub const PAGE_SIZE: u64 = 5;

/// Page position within the pending-claim list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page actually served (0 when there are no pages)
    pub current: u64,
    /// Total pages
    pub pages: u64,
    /// Total pending claims
    pub total: u64,
}

impl Page {
    /// Clamp `requested` into `[1, pages]`; with no pages the page is 0
    pub fn clamp(requested: i64, total: u64) -> Self {
        let pages = total.div_ceil(PAGE_SIZE);
        let current = if pages == 0 {
            0
        } else {
            requested.clamp(1, i64::try_from(pages).unwrap_or(i64::MAX)) as u64
        };
        Self {
            current,
            pages,
            total,
        }
    }

    /// Rows to skip
    pub fn offset(&self) -> u64 {
        self.current.saturating_sub(1) * PAGE_SIZE
    }
}

/// Parse the `page` query parameter. Missing means page 1; unparsable
/// records an error and also means page 1.
pub fn parse_page(raw: Option<&str>, errors: &mut ErrorList) -> i64 {
    match raw {
        None => 1,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(page) => page,
            Err(_) => {
                errors.push(ResolutionError::InvalidPage(raw.to_string()));
                1
            }
        },
    }
}

/// One listed claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimItem {
    /// Claim id
    #[serde(rename = "claimID")]
    pub claim_id: i64,
    /// Raw claim JWT
    pub claim: String,
    /// Always PENDING
    pub status: ClaimStatus,
    /// Submission time
    pub created: String,
}

impl From<ClaimRecord> for ClaimItem {
    fn from(record: ClaimRecord) -> Self {
        Self {
            claim_id: record.id,
            claim: record.claim,
            status: record.status,
            created: record.created,
        }
    }
}

/// A page of pending ID claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsPage {
    /// Claims on this page, oldest first
    pub items: Vec<ClaimItem>,
    /// Page position
    pub page: Page,
}

/// List pending ID claims for the requested page
pub async fn list_pending(
    store: &dyn LedgerStore,
    requested: i64,
    errors: &mut ErrorList,
) -> ClaimsPage {
    let total = errors
        .record(store.count_pending(ATTESTATION_SCOPE).await)
        .unwrap_or_default();
    let page = Page::clamp(requested, total);

    let items = if page.current == 0 {
        Vec::new()
    } else {
        errors
            .record(
                store
                    .list_pending(ATTESTATION_SCOPE, PAGE_SIZE, page.offset())
                    .await,
            )
            .unwrap_or_default()
            .into_iter()
            .map(ClaimItem::from)
            .collect()
    };
    ClaimsPage { items, page }
}

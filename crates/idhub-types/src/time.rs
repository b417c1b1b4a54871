//! Ledger timestamps

use chrono::Utc;

/// Format of every `created` / `updated` column (UTC, second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time formatted for the ledgers.
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

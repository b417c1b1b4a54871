//! Table definitions
//!
//! Created idempotently every time a store is opened.

use rusqlite::Connection;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL DEFAULT '',
    idnumber       TEXT NOT NULL DEFAULT '',
    phone          TEXT NOT NULL DEFAULT '',
    email          TEXT NOT NULL DEFAULT '',
    country        TEXT NOT NULL DEFAULT '',
    region         TEXT NOT NULL DEFAULT '',
    locality       TEXT NOT NULL DEFAULT '',
    street_address TEXT NOT NULL DEFAULT '',
    postal_code    TEXT NOT NULL DEFAULT '',
    publickey      TEXT NOT NULL UNIQUE,
    address        TEXT NOT NULL DEFAULT '',
    proxy          TEXT NOT NULL UNIQUE,
    controller     TEXT NOT NULL DEFAULT '',
    recovery       TEXT NOT NULL DEFAULT '',
    ipfs           TEXT NOT NULL DEFAULT '',
    description    TEXT NOT NULL DEFAULT '',
    created        TEXT NOT NULL,
    updated        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tokens (
    token   TEXT PRIMARY KEY NOT NULL,
    valid   INTEGER NOT NULL,
    proxy   TEXT NOT NULL,
    scope   TEXT NOT NULL,
    created TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS claims (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    proxy   TEXT NOT NULL,
    type    TEXT NOT NULL,
    status  TEXT NOT NULL,
    claim   TEXT NOT NULL,
    created TEXT NOT NULL,
    updated TEXT NOT NULL,
    UNIQUE (proxy, type, claim)
);

CREATE INDEX IF NOT EXISTS idx_claims_status_type
    ON claims (status, type, created, id);

CREATE INDEX IF NOT EXISTS idx_claims_proxy_type
    ON claims (proxy, type, created, id);

CREATE TABLE IF NOT EXISTS attestations (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    claim_id    INTEGER NOT NULL REFERENCES claims (id),
    attestant   TEXT NOT NULL,
    attestation TEXT NOT NULL,
    status      TEXT NOT NULL,
    created     TEXT NOT NULL,
    updated     TEXT NOT NULL,
    UNIQUE (claim_id, attestant)
);
";

/// Create every ledger table that does not exist yet
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

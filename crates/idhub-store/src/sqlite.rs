//! SQLite ledger store
//!
//! One connection guarded by a mutex; every statement runs on the blocking
//! pool so async callers never stall a runtime worker.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use idhub_types::{
    AttestationRecord, ClaimRecord, ClaimStatus, NewAttestation, NewClaim, NewUser, TokenRecord,
    TokenResolution, UserRecord, now_timestamp,
};

use crate::error::{StoreError, StoreResult};
use crate::schema::init_schema;
use crate::store::{
    AttestationWrite, Attested, ClaimSubmission, ClaimTarget, LedgerStore, UserRegistration,
};

const CLAIM_COLUMNS: &str = "id, proxy, type, status, claim, created, updated";
const ATTESTATION_COLUMNS: &str =
    "id, claim_id, attestant, attestation, status, created, updated";
const USER_COLUMNS: &str = "id, name, idnumber, phone, email, country, region, locality, \
     street_address, postal_code, publickey, address, proxy, controller, recovery, ipfs, \
     description, created, updated";

/// Ledger store backed by a single SQLite connection
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and ensure the schema.
    ///
    /// `":memory:"` opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened ledger database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }
}

fn status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ClaimStatus> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn claim_from_row(row: &Row<'_>) -> rusqlite::Result<ClaimRecord> {
    Ok(ClaimRecord {
        id: row.get(0)?,
        proxy: row.get(1)?,
        claim_type: row.get(2)?,
        status: status_column(row, 3)?,
        claim: row.get(4)?,
        created: row.get(5)?,
        updated: row.get(6)?,
    })
}

fn attestation_from_row(row: &Row<'_>) -> rusqlite::Result<AttestationRecord> {
    Ok(AttestationRecord {
        id: row.get(0)?,
        claim_id: row.get(1)?,
        attestant: row.get(2)?,
        attestation: row.get(3)?,
        status: status_column(row, 4)?,
        created: row.get(5)?,
        updated: row.get(6)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        id_number: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        country: row.get(5)?,
        region: row.get(6)?,
        locality: row.get(7)?,
        street_address: row.get(8)?,
        postal_code: row.get(9)?,
        public_key: row.get(10)?,
        address: row.get(11)?,
        proxy: row.get(12)?,
        controller: row.get(13)?,
        recovery: row.get(14)?,
        ipfs: row.get(15)?,
        description: row.get(16)?,
        created: row.get(17)?,
        updated: row.get(18)?,
    })
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn upsert_token(&self, resolution: TokenResolution) -> StoreResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO tokens (token, valid, proxy, scope, created)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (token) DO UPDATE SET
                     valid = excluded.valid,
                     proxy = excluded.proxy,
                     scope = excluded.scope,
                     created = excluded.created",
                params![
                    resolution.token,
                    resolution.valid,
                    resolution.proxy,
                    resolution.scope,
                    now_timestamp()
                ],
            )?;
            debug!(valid = resolution.valid, "Token resolution recorded");
            Ok(())
        })
        .await
    }

    async fn find_token(&self, token: &str) -> StoreResult<Option<TokenRecord>> {
        let token = token.to_string();
        self.with_conn(move |conn| {
            let record = conn
                .query_row(
                    "SELECT token, valid, proxy, scope, created FROM tokens WHERE token = ?1",
                    params![token],
                    |row| {
                        Ok(TokenRecord {
                            token: row.get(0)?,
                            valid: row.get(1)?,
                            proxy: row.get(2)?,
                            scope: row.get(3)?,
                            created: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn submit_claim(&self, claim: NewClaim) -> StoreResult<ClaimSubmission> {
        self.with_conn(move |conn| {
            let now = now_timestamp();
            let inserted = conn.execute(
                "INSERT INTO claims (proxy, type, status, claim, created, updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT (proxy, type, claim) DO NOTHING",
                params![
                    claim.proxy,
                    claim.claim_type,
                    ClaimStatus::Pending.as_str(),
                    claim.claim,
                    now
                ],
            )?;
            if inserted == 0 {
                return Ok(ClaimSubmission::Existed);
            }
            let id = conn.last_insert_rowid();
            debug!(id, claim_type = %claim.claim_type, "Claim submitted");
            Ok(ClaimSubmission::Inserted(ClaimRecord {
                id,
                proxy: claim.proxy,
                claim_type: claim.claim_type,
                status: ClaimStatus::Pending,
                claim: claim.claim,
                created: now.clone(),
                updated: now,
            }))
        })
        .await
    }

    async fn attest_claim(
        &self,
        target: ClaimTarget,
        attestation: NewAttestation,
    ) -> StoreResult<Attested> {
        self.with_conn(move |conn| {
            let now = now_timestamp();
            let tx = conn.transaction()?;

            let claimed = tx.execute(
                "UPDATE claims SET status = ?1, updated = ?2
                 WHERE id = ?3 AND proxy = ?4 AND type = ?5",
                params![
                    attestation.status.as_str(),
                    now,
                    target.id,
                    target.proxy,
                    target.claim_type
                ],
            )?;
            if claimed == 0 {
                return Err(StoreError::NotFound("Claim"));
            }

            let overwritten = tx.execute(
                "UPDATE attestations SET attestation = ?1, status = ?2, updated = ?3
                 WHERE claim_id = ?4 AND attestant = ?5",
                params![
                    attestation.attestation,
                    attestation.status.as_str(),
                    now,
                    target.id,
                    attestation.attestant
                ],
            )?;

            let write = if overwritten > 0 {
                AttestationWrite::Updated
            } else if attestation.status == ClaimStatus::Approved {
                tx.execute(
                    "INSERT INTO attestations
                         (claim_id, attestant, attestation, status, created, updated)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        target.id,
                        attestation.attestant,
                        attestation.attestation,
                        attestation.status.as_str(),
                        now
                    ],
                )?;
                AttestationWrite::Inserted
            } else {
                AttestationWrite::Skipped
            };

            tx.commit()?;
            debug!(claim_id = target.id, status = %attestation.status, ?write, "Claim attested");
            Ok(Attested {
                status: attestation.status,
                updated: now,
                write,
            })
        })
        .await
    }

    async fn latest_claim(
        &self,
        proxy: &str,
        claim_type: &str,
    ) -> StoreResult<Option<ClaimRecord>> {
        let (proxy, claim_type) = (proxy.to_string(), claim_type.to_string());
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {CLAIM_COLUMNS} FROM claims WHERE proxy = ?1 AND type = ?2
                 ORDER BY created DESC, id DESC LIMIT 1"
            );
            Ok(conn
                .query_row(&sql, params![proxy, claim_type], claim_from_row)
                .optional()?)
        })
        .await
    }

    async fn latest_approved_claim(
        &self,
        proxy: &str,
        claim_type: &str,
    ) -> StoreResult<Option<ClaimRecord>> {
        let (proxy, claim_type) = (proxy.to_string(), claim_type.to_string());
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {CLAIM_COLUMNS} FROM claims
                 WHERE proxy = ?1 AND type = ?2 AND status = ?3
                 ORDER BY created DESC, id DESC LIMIT 1"
            );
            Ok(conn
                .query_row(
                    &sql,
                    params![proxy, claim_type, ClaimStatus::Approved.as_str()],
                    claim_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn latest_attestation(&self, claim_id: i64) -> StoreResult<Option<AttestationRecord>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {ATTESTATION_COLUMNS} FROM attestations WHERE claim_id = ?1
                 ORDER BY updated DESC, id DESC LIMIT 1"
            );
            Ok(conn
                .query_row(&sql, params![claim_id], attestation_from_row)
                .optional()?)
        })
        .await
    }

    async fn latest_approved_attestation(
        &self,
        claim_id: i64,
    ) -> StoreResult<Option<AttestationRecord>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {ATTESTATION_COLUMNS} FROM attestations
                 WHERE claim_id = ?1 AND status = ?2
                 ORDER BY created DESC, id DESC LIMIT 1"
            );
            Ok(conn
                .query_row(
                    &sql,
                    params![claim_id, ClaimStatus::Approved.as_str()],
                    attestation_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn count_pending(&self, claim_type: &str) -> StoreResult<u64> {
        let claim_type = claim_type.to_string();
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM claims WHERE status = ?1 AND type = ?2",
                params![ClaimStatus::Pending.as_str(), claim_type],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn list_pending(
        &self,
        claim_type: &str,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<ClaimRecord>> {
        let claim_type = claim_type.to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {CLAIM_COLUMNS} FROM claims WHERE status = ?1 AND type = ?2
                 ORDER BY created ASC, id ASC LIMIT ?3 OFFSET ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let claims = stmt
                .query_map(
                    params![
                        ClaimStatus::Pending.as_str(),
                        claim_type,
                        to_sql_int(limit),
                        to_sql_int(offset)
                    ],
                    claim_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(claims)
        })
        .await
    }

    async fn find_user(&self, proxy: &str) -> StoreResult<Option<UserRecord>> {
        let proxy = proxy.to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE proxy = ?1");
            Ok(conn
                .query_row(&sql, params![proxy], user_from_row)
                .optional()?)
        })
        .await
    }

    async fn register_user(&self, user: NewUser) -> StoreResult<UserRegistration> {
        self.with_conn(move |conn| {
            let now = now_timestamp();
            let inserted = conn.execute(
                "INSERT INTO users (name, idnumber, phone, email, country, region, locality,
                     street_address, postal_code, publickey, address, proxy, controller,
                     recovery, ipfs, description, created, updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?17)
                 ON CONFLICT (publickey) DO NOTHING",
                params![
                    user.name,
                    user.id_number,
                    user.phone,
                    user.email,
                    user.country,
                    user.region,
                    user.locality,
                    user.street_address,
                    user.postal_code,
                    user.public_key,
                    user.address,
                    user.proxy,
                    user.controller,
                    user.recovery,
                    user.ipfs,
                    user.description,
                    now
                ],
            )?;
            if inserted == 0 {
                return Ok(UserRegistration::Existing);
            }
            let id = conn.last_insert_rowid();
            debug!(id, "User registered");
            Ok(UserRegistration::Registered(UserRecord {
                id,
                name: user.name,
                id_number: user.id_number,
                phone: user.phone,
                email: user.email,
                country: user.country,
                region: user.region,
                locality: user.locality,
                street_address: user.street_address,
                postal_code: user.postal_code,
                public_key: user.public_key,
                address: user.address,
                proxy: user.proxy,
                controller: user.controller,
                recovery: user.recovery,
                ipfs: user.ipfs,
                description: user.description,
                created: now.clone(),
                updated: now,
            }))
        })
        .await
    }
}

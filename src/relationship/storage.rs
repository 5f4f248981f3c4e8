//! `SQLite` storage for the friend-request ledger.
//!
//! This module provides persistent storage for friend-request records.
//! Each record carries the canonical (sorted) pair columns alongside the
//! directed sender/receiver columns so the at-most-one-active-record
//! invariant can be enforced with a partial unique index at the schema
//! level, as a backstop to the check performed under the pair lock.

// SQLite operations need to hold the lock for the duration of the operation.
// Dropping the guard earlier would require restructuring all methods.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::{RelationshipError, Result};
use super::types::{FriendRequestRecord, PairKey, RequestId, RequestStatus, UserId};

/// `SQLite`-based storage for friend-request records.
///
/// Thread-safe wrapper around a `SQLite` connection. Individual
/// statements are serialized by the connection mutex; check-then-act
/// sequences are serialized per pair by [`FriendRequestService`].
///
/// [`FriendRequestService`]: crate::relationship::FriendRequestService
pub struct LedgerStorage {
    conn: Mutex<Connection>,
}

impl LedgerStorage {
    /// Creates a new storage instance at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute_batch(
            r"
            -- Friend-request ledger (single source of truth for friendship)
            CREATE TABLE IF NOT EXISTS friend_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender TEXT NOT NULL,
                receiver TEXT NOT NULL,
                pair_low TEXT NOT NULL,
                pair_high TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- At most one pending/accepted record per unordered pair
            CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_requests_active_pair
                ON friend_requests(pair_low, pair_high)
                WHERE status IN ('pending', 'accepted');

            CREATE INDEX IF NOT EXISTS idx_friend_requests_receiver
                ON friend_requests(receiver, status);
            CREATE INDEX IF NOT EXISTS idx_friend_requests_sender
                ON friend_requests(sender, status);
            ",
        )?;

        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RelationshipError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    // ==================== Record Operations ====================

    /// Inserts a new pending request and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including a
    /// constraint violation when an active record already exists for
    /// the pair.
    pub fn insert_request(
        &self,
        sender: &str,
        receiver: &str,
        now: i64,
    ) -> Result<FriendRequestRecord> {
        let pair = PairKey::new(sender, receiver);
        let conn = self.lock_conn()?;

        conn.execute(
            r"
            INSERT INTO friend_requests (sender, receiver, pair_low, pair_high, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?5)
            ",
            params![sender, receiver, pair.low(), pair.high(), now],
        )?;

        Ok(FriendRequestRecord {
            id: conn.last_insert_rowid(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieves a request by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_request(&self, id: RequestId) -> Result<Option<FriendRequestRecord>> {
        let conn = self.lock_conn()?;

        conn.query_row(
            r"
            SELECT id, sender, receiver, status, created_at, updated_at
            FROM friend_requests
            WHERE id = ?1
            ",
            params![id],
            map_record,
        )
        .optional()
        .map_err(RelationshipError::from)
    }

    /// Transitions a request to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_status(&self, id: RequestId, status: RequestStatus, now: i64) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute(
            r"
            UPDATE friend_requests
            SET status = ?2, updated_at = ?3
            WHERE id = ?1
            ",
            params![id, status.as_str(), now],
        )?;

        Ok(())
    }

    /// Deletes a request record.
    ///
    /// Used by unfriend, which returns the pair to the unconnected state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_request(&self, id: RequestId) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute("DELETE FROM friend_requests WHERE id = ?1", params![id])?;

        Ok(())
    }

    // ==================== Pair Queries ====================

    /// Retrieves the pending or accepted record for a pair, if any.
    ///
    /// The partial unique index guarantees at most one such record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn active_request_for_pair(&self, pair: &PairKey) -> Result<Option<FriendRequestRecord>> {
        let conn = self.lock_conn()?;

        conn.query_row(
            r"
            SELECT id, sender, receiver, status, created_at, updated_at
            FROM friend_requests
            WHERE pair_low = ?1 AND pair_high = ?2 AND status IN ('pending', 'accepted')
            ",
            params![pair.low(), pair.high()],
            map_record,
        )
        .optional()
        .map_err(RelationshipError::from)
    }

    /// Retrieves the accepted record for a pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn accepted_request_for_pair(&self, pair: &PairKey) -> Result<Option<FriendRequestRecord>> {
        let conn = self.lock_conn()?;

        conn.query_row(
            r"
            SELECT id, sender, receiver, status, created_at, updated_at
            FROM friend_requests
            WHERE pair_low = ?1 AND pair_high = ?2 AND status = 'accepted'
            ",
            params![pair.low(), pair.high()],
            map_record,
        )
        .optional()
        .map_err(RelationshipError::from)
    }

    // ==================== Listing Queries ====================

    /// Retrieves pending requests addressed to a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pending_requests_to(&self, receiver: &str) -> Result<Vec<FriendRequestRecord>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, sender, receiver, status, created_at, updated_at
            FROM friend_requests
            WHERE receiver = ?1 AND status = 'pending'
            ORDER BY created_at ASC
            ",
        )?;

        let records = stmt
            .query_map(params![receiver], map_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Retrieves pending requests sent by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pending_requests_from(&self, sender: &str) -> Result<Vec<FriendRequestRecord>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, sender, receiver, status, created_at, updated_at
            FROM friend_requests
            WHERE sender = ?1 AND status = 'pending'
            ORDER BY created_at ASC
            ",
        )?;

        let records = stmt
            .query_map(params![sender], map_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Retrieves the ids of all users with an accepted record with `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn accepted_partners_of(&self, user: &str) -> Result<Vec<UserId>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r"
            SELECT CASE WHEN sender = ?1 THEN receiver ELSE sender END
            FROM friend_requests
            WHERE (sender = ?1 OR receiver = ?1) AND status = 'accepted'
            ORDER BY updated_at DESC
            ",
        )?;

        let partners = stmt
            .query_map(params![user], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(partners)
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<FriendRequestRecord> {
    let status_str: String = row.get(3)?;
    let status = RequestStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("Invalid request status: {status_str}").into(),
        )
    })?;

    Ok(FriendRequestRecord {
        id: row.get(0)?,
        sender: row.get(1)?,
        receiver: row.get(2)?,
        status,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

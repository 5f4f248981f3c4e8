//! `SQLite` storage for per-field audience settings.
//!
//! One row per (owner, field). Settings are only ever inserted or
//! overwritten, never deleted; absence of a row means the default level
//! (public) applies.

// SQLite operations need to hold the lock for the duration of the operation.
// Dropping the guard earlier would require restructuring all methods.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::error::{AudienceError, Result};
use super::fields::{AudienceLevel, ProfileField};

/// `SQLite`-based storage for audience settings.
///
/// Thread-safe wrapper around a `SQLite` connection. Bulk writes run in
/// a transaction so a partial update is never observable.
pub struct AudienceStorage {
    conn: Mutex<Connection>,
}

impl AudienceStorage {
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
            -- Per-field visibility preferences (absent row = public)
            CREATE TABLE IF NOT EXISTS audience_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                field TEXT NOT NULL,
                level TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(owner, field)
            );
            ",
        )?;

        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AudienceError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    /// Writes one setting, overwriting any prior value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set(
        &self,
        owner: &str,
        field: ProfileField,
        level: AudienceLevel,
        now: i64,
    ) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute(
            r"
            INSERT INTO audience_settings (owner, field, level, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(owner, field) DO UPDATE SET
                level = excluded.level,
                updated_at = excluded.updated_at
            ",
            params![owner, field.key(), level.as_str(), now],
        )?;

        Ok(())
    }

    /// Writes several settings for one owner in a single transaction.
    ///
    /// All-or-nothing: if any write fails, none are applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_many(
        &self,
        owner: &str,
        settings: &[(ProfileField, AudienceLevel)],
        now: i64,
    ) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        for (field, level) in settings {
            tx.execute(
                r"
                INSERT INTO audience_settings (owner, field, level, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(owner, field) DO UPDATE SET
                    level = excluded.level,
                    updated_at = excluded.updated_at
                ",
                params![owner, field.key(), level.as_str(), now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Reads one setting, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, owner: &str, field: ProfileField) -> Result<Option<AudienceLevel>> {
        let conn = self.lock_conn()?;

        let level_str: Option<String> = conn
            .query_row(
                "SELECT level FROM audience_settings WHERE owner = ?1 AND field = ?2",
                params![owner, field.key()],
                |row| row.get(0),
            )
            .optional()?;

        match level_str {
            Some(s) => AudienceLevel::parse(&s)
                .map(Some)
                .ok_or_else(|| AudienceError::Storage(format!("Invalid stored level: {s}"))),
            None => Ok(None),
        }
    }

    /// Reads all configured settings for an owner.
    ///
    /// Fields with no row are absent; callers fill in the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_all(&self, owner: &str) -> Result<Vec<(ProfileField, AudienceLevel)>> {
        let conn = self.lock_conn()?;

        let mut stmt =
            conn.prepare("SELECT field, level FROM audience_settings WHERE owner = ?1")?;

        let rows = stmt
            .query_map(params![owner], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut settings = Vec::with_capacity(rows.len());
        for (field_str, level_str) in rows {
            // Rows written before a field was removed from the closed set
            // are skipped rather than failing the whole read.
            let Some(field) = ProfileField::parse(&field_str) else {
                continue;
            };
            let level = AudienceLevel::parse(&level_str)
                .ok_or_else(|| AudienceError::Storage(format!("Invalid stored level: {level_str}")))?;
            settings.push((field, level));
        }

        Ok(settings)
    }
}

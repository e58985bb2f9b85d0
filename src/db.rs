//! Database module for Flashy
//!
//! Provides persistence for users (with their conversation state) and their
//! word/definition pairs.

mod schema;

pub use schema::*;

use crate::state_machine::{StateTag, StoredState};
use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("Database unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("Entity already exists")]
    Duplicate,
    #[error("No rows affected")]
    NoRowsAffected,
    #[error("State of user {0} changed since it was read")]
    StateConflict(i64),
    #[error("Corrupt state for user {user_id}: {reason}")]
    CorruptState { user_id: i64, reason: String },
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let failure = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some((e.code, e.extended_code)),
            _ => None,
        };

        match failure {
            Some((_, ffi::SQLITE_CONSTRAINT_UNIQUE)) => DbError::Duplicate,
            Some((
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen,
                _,
            )) => DbError::Unavailable(err.to_string()),
            _ => DbError::Sqlite(err),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DbError::Unavailable("connection lock poisoned".to_string()))
    }

    // ==================== User Operations ====================

    /// Resolve an external sender id to a user, creating it on first contact.
    ///
    /// Returns the user and whether it was created by this call.
    pub fn resolve_user(&self, external_id: i64) -> DbResult<(User, bool)> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let initial = StoredState::initial();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users
                 (external_id, state, state_data, state_updated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                external_id,
                initial.tag.as_str(),
                serde_json::to_string(&initial.payload)?,
                now
            ],
        )?;

        let user = conn
            .query_row(
                "SELECT id, external_id, state, state_data, created_at
                 FROM users WHERE external_id = ?1",
                params![external_id],
                UserRow::from_row,
            )?
            .into_user()?;

        Ok((user, inserted == 1))
    }

    /// Get user by internal ID
    pub fn get_user(&self, id: i64) -> DbResult<User> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, external_id, state, state_data, created_at FROM users WHERE id = ?1",
            params![id],
            UserRow::from_row,
        )
        .optional()?
        .ok_or(DbError::UserNotFound(id))?
        .into_user()
    }

    /// Load the raw (unvalidated) conversation state of a user
    pub fn load_state(&self, user_id: i64) -> DbResult<StoredState> {
        Ok(self.get_user(user_id)?.state)
    }

    /// Write `next` only if the stored tag is still `expected`
    pub fn commit_state(
        &self,
        user_id: i64,
        expected: StateTag,
        next: &StoredState,
    ) -> DbResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let updated = conn.execute(
            "UPDATE users SET state = ?1, state_data = ?2, state_updated_at = ?3
             WHERE id = ?4 AND state = ?5",
            params![
                next.tag.as_str(),
                serde_json::to_string(&next.payload)?,
                now,
                user_id,
                expected.as_str()
            ],
        )?;

        if updated == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                params![user_id],
                |row| row.get(0),
            )?;
            return Err(if exists {
                DbError::StateConflict(user_id)
            } else {
                DbError::UserNotFound(user_id)
            });
        }
        Ok(())
    }

    /// Unconditionally force a user back to `default`/`null`
    pub fn reset_state(&self, user_id: i64) -> DbResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let initial = StoredState::initial();

        let updated = conn.execute(
            "UPDATE users SET state = ?1, state_data = ?2, state_updated_at = ?3 WHERE id = ?4",
            params![
                initial.tag.as_str(),
                serde_json::to_string(&initial.payload)?,
                now,
                user_id
            ],
        )?;

        if updated == 0 {
            return Err(DbError::UserNotFound(user_id));
        }
        Ok(())
    }

    /// Overwrite state without validation (for tests simulating corruption)
    #[cfg(test)]
    pub fn write_raw_state(&self, user_id: i64, state: &str, state_data: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET state = ?1, state_data = ?2 WHERE id = ?3",
            params![state, state_data, user_id],
        )?;
        Ok(())
    }

    // ==================== Definition Operations ====================

    /// Insert a new pair. Fails with `Duplicate` if the user already has `word`.
    pub fn create_pair(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> DbResult<LearningPairWithId> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO definitions (user_id, word, definition, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, word, definition, now],
        )?;

        Ok(LearningPairWithId {
            id: conn.last_insert_rowid(),
            pair: LearningPair::new(word, definition),
        })
    }

    /// Remove exactly one pair. Fails with `NoRowsAffected` if none matched.
    pub fn remove_pair(&self, user_id: i64, word: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM definitions WHERE user_id = ?1 AND word = ?2",
            params![user_id, word],
        )?;

        if deleted == 0 {
            return Err(DbError::NoRowsAffected);
        }
        Ok(())
    }

    /// Replace the definition of an existing pair; never inserts.
    pub fn update_definition(&self, user_id: i64, word: &str, definition: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE definitions SET definition = ?1 WHERE user_id = ?2 AND word = ?3",
            params![definition, user_id, word],
        )?;

        if updated == 0 {
            return Err(DbError::NoRowsAffected);
        }
        Ok(())
    }

    pub fn get_exact_pair(&self, user_id: i64, word: &str) -> DbResult<Option<LearningPairWithId>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, word, definition FROM definitions WHERE user_id = ?1 AND word = ?2",
            params![user_id, word],
            pair_from_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn get_pair_by_id(&self, user_id: i64, id: i64) -> DbResult<Option<LearningPairWithId>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, word, definition FROM definitions WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
            pair_from_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    /// Pick one of the user's pairs uniformly at random
    pub fn get_random_pair(&self, user_id: i64) -> DbResult<Option<LearningPairWithId>> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM definitions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        if count == 0 {
            return Ok(None);
        }

        let offset = rand::thread_rng().gen_range(0..count);
        conn.query_row(
            "SELECT id, word, definition FROM definitions
             WHERE user_id = ?1 ORDER BY id LIMIT 1 OFFSET ?2",
            params![user_id, offset],
            pair_from_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    /// Up to `page_size` pairs with `id > cursor`, ascending by id
    pub fn list_pairs(
        &self,
        user_id: i64,
        cursor: i64,
        page_size: usize,
    ) -> DbResult<Vec<LearningPairWithId>> {
        let conn = self.conn()?;
        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            "SELECT id, word, definition FROM definitions
             WHERE user_id = ?1 AND id > ?2
             ORDER BY id
             LIMIT ?3",
        )?;

        let rows = stmt.query_map(params![user_id, cursor, limit], pair_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

/// Raw user row before the state columns are parsed
struct UserRow {
    id: i64,
    external_id: i64,
    state: String,
    state_data: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            state: row.get(2)?,
            state_data: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_user(self) -> DbResult<User> {
        let tag = StateTag::parse(&self.state).ok_or_else(|| DbError::CorruptState {
            user_id: self.id,
            reason: format!("unknown state tag {:?}", self.state),
        })?;
        let payload =
            serde_json::from_str(&self.state_data).map_err(|_| DbError::CorruptState {
                user_id: self.id,
                reason: "state_data is not valid JSON".to_string(),
            })?;

        Ok(User {
            id: self.id,
            external_id: self.external_id,
            state: StoredState::new(tag, payload),
            created_at: parse_datetime(&self.created_at),
        })
    }
}

fn pair_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LearningPairWithId> {
    Ok(LearningPairWithId {
        id: row.get(0)?,
        pair: LearningPair {
            word: row.get(1)?,
            definition: row.get(2)?,
        },
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

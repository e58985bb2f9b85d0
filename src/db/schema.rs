//! Database schema and types

use crate::state_machine::StoredState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
///
/// `AUTOINCREMENT` keeps pair ids strictly increasing and never reused after
/// deletion, which the word-list cursor relies on.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id INTEGER NOT NULL UNIQUE,
    state TEXT NOT NULL DEFAULT 'default',
    state_data TEXT NOT NULL DEFAULT 'null',
    state_updated_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    word TEXT NOT NULL,
    definition TEXT NOT NULL,
    created_at TEXT NOT NULL,

    UNIQUE (user_id, word),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_definitions_user ON definitions(user_id, id);
";

/// User record
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub external_id: i64,
    pub state: StoredState,
    pub created_at: DateTime<Utc>,
}

/// A word and its definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPair {
    pub word: String,
    pub definition: String,
}

impl LearningPair {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
        }
    }
}

/// A pair together with its storage id (the word-list cursor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPairWithId {
    pub id: i64,
    #[serde(flatten)]
    pub pair: LearningPair,
}

//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the controller with mock implementations.

use super::error::StoreError;
use crate::db::{Database, DbResult, LearningPairWithId};
use crate::state_machine::{StateTag, StoredState};
use async_trait::async_trait;
use std::sync::Arc;

/// Maps transport-native sender ids to internal user ids
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve (creating on first contact) and report whether the user is new
    async fn resolve_user(&self, external_id: i64) -> Result<(i64, bool), StoreError>;
}

/// Storage for per-user conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the raw state; the payload is not validated here
    async fn load_state(&self, user_id: i64) -> Result<StoredState, StoreError>;

    /// Commit `next` if the stored tag still equals `expected`
    async fn commit_state(
        &self,
        user_id: i64,
        expected: StateTag,
        next: &StoredState,
    ) -> Result<(), StoreError>;

    /// Force the user back to `default`/`null`
    async fn reset_state(&self, user_id: i64) -> Result<(), StoreError>;
}

/// Per-user word/definition pairs
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    async fn create_pair(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> Result<LearningPairWithId, StoreError>;

    async fn remove_pair(&self, user_id: i64, word: &str) -> Result<(), StoreError>;

    async fn update_definition(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> Result<(), StoreError>;

    async fn get_exact_pair(
        &self,
        user_id: i64,
        word: &str,
    ) -> Result<Option<LearningPairWithId>, StoreError>;

    async fn get_pair_by_id(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<LearningPairWithId>, StoreError>;

    async fn get_random_pair(&self, user_id: i64)
        -> Result<Option<LearningPairWithId>, StoreError>;

    async fn list_pairs(
        &self,
        user_id: i64,
        cursor: i64,
        page_size: usize,
    ) -> Result<Vec<LearningPairWithId>, StoreError>;
}

/// Combined storage trait for convenience
pub trait Storage: IdentityStore + StateStore + VocabularyStore {}
impl<T: IdentityStore + StateStore + VocabularyStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    async fn resolve_user(&self, external_id: i64) -> Result<(i64, bool), StoreError> {
        (**self).resolve_user(external_id).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn load_state(&self, user_id: i64) -> Result<StoredState, StoreError> {
        (**self).load_state(user_id).await
    }

    async fn commit_state(
        &self,
        user_id: i64,
        expected: StateTag,
        next: &StoredState,
    ) -> Result<(), StoreError> {
        (**self).commit_state(user_id, expected, next).await
    }

    async fn reset_state(&self, user_id: i64) -> Result<(), StoreError> {
        (**self).reset_state(user_id).await
    }
}

#[async_trait]
impl<T: VocabularyStore + ?Sized> VocabularyStore for Arc<T> {
    async fn create_pair(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> Result<LearningPairWithId, StoreError> {
        (**self).create_pair(user_id, word, definition).await
    }

    async fn remove_pair(&self, user_id: i64, word: &str) -> Result<(), StoreError> {
        (**self).remove_pair(user_id, word).await
    }

    async fn update_definition(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> Result<(), StoreError> {
        (**self).update_definition(user_id, word, definition).await
    }

    async fn get_exact_pair(
        &self,
        user_id: i64,
        word: &str,
    ) -> Result<Option<LearningPairWithId>, StoreError> {
        (**self).get_exact_pair(user_id, word).await
    }

    async fn get_pair_by_id(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<LearningPairWithId>, StoreError> {
        (**self).get_pair_by_id(user_id, id).await
    }

    async fn get_random_pair(
        &self,
        user_id: i64,
    ) -> Result<Option<LearningPairWithId>, StoreError> {
        (**self).get_random_pair(user_id).await
    }

    async fn list_pairs(
        &self,
        user_id: i64,
        cursor: i64,
        page_size: usize,
    ) -> Result<Vec<LearningPairWithId>, StoreError> {
        (**self).list_pairs(user_id, cursor, page_size).await
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Adapter to use Database as Storage
///
/// SQLite calls block, so each one runs on the blocking pool.
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Internal(format!("storage task failed: {e}")))?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl IdentityStore for DatabaseStorage {
    async fn resolve_user(&self, external_id: i64) -> Result<(i64, bool), StoreError> {
        self.blocking(move |db| {
            let (user, created) = db.resolve_user(external_id)?;
            if created {
                tracing::info!(
                    user_id = user.id,
                    external_id = user.external_id,
                    created_at = %user.created_at,
                    "Registered new user"
                );
            }
            Ok((user.id, created))
        })
        .await
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn load_state(&self, user_id: i64) -> Result<StoredState, StoreError> {
        self.blocking(move |db| db.load_state(user_id)).await
    }

    async fn commit_state(
        &self,
        user_id: i64,
        expected: StateTag,
        next: &StoredState,
    ) -> Result<(), StoreError> {
        let next = next.clone();
        self.blocking(move |db| db.commit_state(user_id, expected, &next))
            .await
    }

    async fn reset_state(&self, user_id: i64) -> Result<(), StoreError> {
        self.blocking(move |db| db.reset_state(user_id)).await
    }
}

#[async_trait]
impl VocabularyStore for DatabaseStorage {
    async fn create_pair(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> Result<LearningPairWithId, StoreError> {
        let (word, definition) = (word.to_string(), definition.to_string());
        self.blocking(move |db| db.create_pair(user_id, &word, &definition))
            .await
    }

    async fn remove_pair(&self, user_id: i64, word: &str) -> Result<(), StoreError> {
        let word = word.to_string();
        self.blocking(move |db| db.remove_pair(user_id, &word)).await
    }

    async fn update_definition(
        &self,
        user_id: i64,
        word: &str,
        definition: &str,
    ) -> Result<(), StoreError> {
        let (word, definition) = (word.to_string(), definition.to_string());
        self.blocking(move |db| db.update_definition(user_id, &word, &definition))
            .await
    }

    async fn get_exact_pair(
        &self,
        user_id: i64,
        word: &str,
    ) -> Result<Option<LearningPairWithId>, StoreError> {
        let word = word.to_string();
        self.blocking(move |db| db.get_exact_pair(user_id, &word))
            .await
    }

    async fn get_pair_by_id(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<LearningPairWithId>, StoreError> {
        self.blocking(move |db| db.get_pair_by_id(user_id, id)).await
    }

    async fn get_random_pair(
        &self,
        user_id: i64,
    ) -> Result<Option<LearningPairWithId>, StoreError> {
        self.blocking(move |db| db.get_random_pair(user_id)).await
    }

    async fn list_pairs(
        &self,
        user_id: i64,
        cursor: i64,
        page_size: usize,
    ) -> Result<Vec<LearningPairWithId>, StoreError> {
        self.blocking(move |db| db.list_pairs(user_id, cursor, page_size))
            .await
    }
}

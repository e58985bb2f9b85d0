//! Error taxonomy for the store contract and the controller

use crate::db::DbError;
use crate::state_machine::{PayloadMismatch, StateTag, TransitionError, Trigger};
use thiserror::Error;

/// Errors surfaced by the store traits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity already exists")]
    Duplicate,
    #[error("entity not found")]
    NotFound,
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error("state of user {0} changed since it was loaded")]
    StateConflict(i64),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store failure: {0}")]
    Internal(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate => StoreError::Duplicate,
            DbError::NoRowsAffected => StoreError::NotFound,
            DbError::UserNotFound(id) => StoreError::UserNotFound(id),
            DbError::StateConflict(id) => StoreError::StateConflict(id),
            DbError::Unavailable(msg) => StoreError::Unavailable(msg),
            e @ (DbError::Sqlite(_) | DbError::Json(_) | DbError::CorruptState { .. }) => {
                StoreError::Internal(e.to_string())
            }
        }
    }
}

/// Everything that can abort a conversation step.
///
/// Only `Storage` is an infrastructure failure; the rest are expected,
/// user-facing outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("{trigger} is not admissible from state {received} (expected one of {expected:?})")]
    TransitionMismatch {
        trigger: Trigger,
        expected: &'static [StateTag],
        received: StateTag,
    },
    #[error(transparent)]
    PayloadMismatch(PayloadMismatch),
    #[error("pair already exists")]
    DuplicateEntity,
    #[error("pair not found")]
    NotFound,
    #[error(transparent)]
    Storage(StoreError),
}

impl From<TransitionError> for ControllerError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Mismatch {
                trigger,
                expected,
                received,
            } => ControllerError::TransitionMismatch {
                trigger,
                expected,
                received,
            },
            TransitionError::Payload(mismatch) => ControllerError::PayloadMismatch(mismatch),
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ControllerError::DuplicateEntity,
            StoreError::NotFound => ControllerError::NotFound,
            other => ControllerError::Storage(other),
        }
    }
}

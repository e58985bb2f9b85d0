//! Conversation state types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

// ============================================================================
// State Tag - What is persisted in the `state` column
// ============================================================================

/// Which step of a multi-turn flow a user is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    #[default]
    Default,
    StudyMode,
    AwaitingWordToAdd,
    AwaitingDefinitionToAdd,
    AwaitingWordToRemove,
    AwaitingWordToFind,
    AwaitingWordToEdit,
    AwaitingDefinitionToEdit,
}

impl StateTag {
    pub const ALL: [StateTag; 8] = [
        StateTag::Default,
        StateTag::StudyMode,
        StateTag::AwaitingWordToAdd,
        StateTag::AwaitingDefinitionToAdd,
        StateTag::AwaitingWordToRemove,
        StateTag::AwaitingWordToFind,
        StateTag::AwaitingWordToEdit,
        StateTag::AwaitingDefinitionToEdit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateTag::Default => "default",
            StateTag::StudyMode => "study_mode",
            StateTag::AwaitingWordToAdd => "awaiting_word_to_add",
            StateTag::AwaitingDefinitionToAdd => "awaiting_definition_to_add",
            StateTag::AwaitingWordToRemove => "awaiting_word_to_remove",
            StateTag::AwaitingWordToFind => "awaiting_word_to_find",
            StateTag::AwaitingWordToEdit => "awaiting_word_to_edit",
            StateTag::AwaitingDefinitionToEdit => "awaiting_definition_to_edit",
        }
    }

    /// Parse the stored column value. Unknown tags yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == s)
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversation State - Tag and payload as one value
// ============================================================================

/// Typed conversation state. The payload lives inside the variant, so a
/// mismatched tag/payload pair cannot be constructed in memory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConvState {
    #[default]
    Default,
    StudyMode,
    AwaitingWordToAdd,
    /// Word captured, waiting for its definition
    AwaitingDefinitionToAdd { word: String },
    AwaitingWordToRemove,
    AwaitingWordToFind,
    AwaitingWordToEdit,
    /// Word captured, waiting for the replacement definition
    AwaitingDefinitionToEdit { word: String },
}

impl ConvState {
    pub fn tag(&self) -> StateTag {
        match self {
            ConvState::Default => StateTag::Default,
            ConvState::StudyMode => StateTag::StudyMode,
            ConvState::AwaitingWordToAdd => StateTag::AwaitingWordToAdd,
            ConvState::AwaitingDefinitionToAdd { .. } => StateTag::AwaitingDefinitionToAdd,
            ConvState::AwaitingWordToRemove => StateTag::AwaitingWordToRemove,
            ConvState::AwaitingWordToFind => StateTag::AwaitingWordToFind,
            ConvState::AwaitingWordToEdit => StateTag::AwaitingWordToEdit,
            ConvState::AwaitingDefinitionToEdit { .. } => StateTag::AwaitingDefinitionToEdit,
        }
    }

    /// Payload as it is written to the `state_data` column
    pub fn payload(&self) -> Value {
        match self {
            ConvState::AwaitingDefinitionToAdd { word }
            | ConvState::AwaitingDefinitionToEdit { word } => json!({ "word": word }),
            _ => Value::Null,
        }
    }

    pub fn to_stored(&self) -> StoredState {
        StoredState {
            tag: self.tag(),
            payload: self.payload(),
        }
    }
}

// ============================================================================
// Stored State - Untrusted view read back from persistence
// ============================================================================

/// State as read back from storage, before validation.
///
/// The payload is kept as raw JSON; use [`crate::state_machine::validate::decode`]
/// to obtain a [`ConvState`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredState {
    pub tag: StateTag,
    pub payload: Value,
}

impl StoredState {
    pub fn new(tag: StateTag, payload: Value) -> Self {
        Self { tag, payload }
    }

    /// State of a freshly created user
    pub fn initial() -> Self {
        ConvState::Default.to_stored()
    }
}

impl Default for StoredState {
    fn default() -> Self {
        Self::initial()
    }
}

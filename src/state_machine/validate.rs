//! Runtime payload validation
//!
//! The state payload crosses a persistence boundary, so its shape is checked
//! against the tag before any field is read. One predicate per tag.

use super::state::{ConvState, StateTag, StoredState};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Shape a tag requires of its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Strictly `null`
    Null,
    /// An object with a string `word` field
    Word,
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadShape::Null => f.write_str("null"),
            PayloadShape::Word => f.write_str("{word: string}"),
        }
    }
}

/// Stored payload does not match its state tag.
///
/// Carries the shape of the actual payload only, never its content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("state {state} expects payload {expected}, found {actual}")]
pub struct PayloadMismatch {
    pub state: StateTag,
    pub expected: PayloadShape,
    pub actual: String,
}

pub fn expected_shape(tag: StateTag) -> PayloadShape {
    match tag {
        StateTag::AwaitingDefinitionToAdd | StateTag::AwaitingDefinitionToEdit => {
            PayloadShape::Word
        }
        StateTag::Default
        | StateTag::StudyMode
        | StateTag::AwaitingWordToAdd
        | StateTag::AwaitingWordToRemove
        | StateTag::AwaitingWordToFind
        | StateTag::AwaitingWordToEdit => PayloadShape::Null,
    }
}

/// Whether `payload` has the shape required by `tag`
pub fn is_valid(tag: StateTag, payload: &Value) -> bool {
    match expected_shape(tag) {
        PayloadShape::Null => payload.is_null(),
        PayloadShape::Word => payload.get("word").is_some_and(Value::is_string),
    }
}

/// Decode an untrusted stored state into a typed one
pub fn decode(stored: &StoredState) -> Result<ConvState, PayloadMismatch> {
    let StoredState { tag, payload } = stored;
    if !is_valid(*tag, payload) {
        return Err(PayloadMismatch {
            state: *tag,
            expected: expected_shape(*tag),
            actual: describe_shape(payload),
        });
    }

    let word = || {
        payload
            .get("word")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(match tag {
        StateTag::Default => ConvState::Default,
        StateTag::StudyMode => ConvState::StudyMode,
        StateTag::AwaitingWordToAdd => ConvState::AwaitingWordToAdd,
        StateTag::AwaitingDefinitionToAdd => ConvState::AwaitingDefinitionToAdd { word: word() },
        StateTag::AwaitingWordToRemove => ConvState::AwaitingWordToRemove,
        StateTag::AwaitingWordToFind => ConvState::AwaitingWordToFind,
        StateTag::AwaitingWordToEdit => ConvState::AwaitingWordToEdit,
        StateTag::AwaitingDefinitionToEdit => ConvState::AwaitingDefinitionToEdit { word: word() },
    })
}

/// Structural description of a JSON value, safe to log.
///
/// `{"word": 3}` becomes `{word: number}`; string contents are never included.
pub fn describe_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(key, v)| format!("{key}: {}", shallow_shape(v)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

fn shallow_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! API request and response types

use crate::runtime::Reply;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One inbound update from the transport
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// Transport-native sender id
    pub sender_id: i64,
    #[serde(flatten)]
    pub update: UpdateKind,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateKind {
    Command { name: String },
    Text { value: String },
    Callback { data: String },
}

/// Response for an update
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// `null` when nothing should be sent back
    pub reply: Option<Reply>,
    /// Transport should remove the inline keyboard message
    pub dismiss: bool,
}

/// Inline keyboard callback payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    SelectPair(i64),
    NextPage(i64),
    Close,
}

const SELECT_PREFIX: &str = "word:";
const NEXT_PREFIX: &str = "list_word_next:";
const CLOSE: &str = "list_word_close";

impl CallbackData {
    pub fn parse(data: &str) -> Result<Self, String> {
        let id = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| format!("Invalid id in callback data: {data}"))
        };

        if data == CLOSE {
            Ok(CallbackData::Close)
        } else if let Some(raw) = data.strip_prefix(NEXT_PREFIX) {
            id(raw).map(CallbackData::NextPage)
        } else if let Some(raw) = data.strip_prefix(SELECT_PREFIX) {
            id(raw).map(CallbackData::SelectPair)
        } else {
            Err(format!("Unknown callback data: {data}"))
        }
    }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackData::SelectPair(id) => write!(f, "{SELECT_PREFIX}{id}"),
            CallbackData::NextPage(cursor) => write!(f, "{NEXT_PREFIX}{cursor}"),
            CallbackData::Close => f.write_str(CLOSE),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

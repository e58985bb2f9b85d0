//! Replies produced by a conversation step
//!
//! Platform-neutral: the transport turns keyboard hints into real keyboards
//! and renders `spoiler` hidden.

use crate::db::LearningPairWithId;
use serde::{Deserialize, Serialize};

pub const GREET: &str = "Nice to meet you!";
pub const GREET_REPEAT: &str = "Nice to see you again!";
pub const BAD_COMMAND: &str = "Oops, let's try again";
pub const BAD_WORD: &str = "Oops, word not found";
pub const ERROR: &str = "Oops, something went wrong";
pub const DUPLICATE_WORD: &str = "Can't add word twice";
pub const NOTHING_TO_SHOW: &str = "Nothing to show";
pub const NOT_UNDERSTOOD: &str = "Sorry, I don't understand you. Please try again";
pub const OK_NEXT: &str = "Ok, what's next?";
pub const WORD_ADD_TYPE: &str = "Type word to add";
pub const DEFINITION_ADD_TYPE: &str = "Type definition to use";
pub const WORD_ADD_OK: &str = "Your word added";
pub const WORD_REMOVE_TYPE: &str = "Type word to remove";
pub const WORD_REMOVE_OK: &str = "Your word removed";
pub const WORD_FIND_TYPE: &str = "Type word to find";
pub const WORD_EDIT_TYPE: &str = "Type word to edit definition";
pub const DEFINITION_EDIT_TYPE: &str = "Type new definition";
pub const DEFINITION_EDIT_OK: &str = "Your definition updated";
pub const WORD_LIST: &str = "Your words";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    /// Hidden half of a pair during study
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoiler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<KeyboardHint>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spoiler: None,
            keyboard: None,
        }
    }

    pub fn with_spoiler(mut self, spoiler: impl Into<String>) -> Self {
        self.spoiler = Some(spoiler.into());
        self
    }

    pub fn with_keyboard(mut self, keyboard: KeyboardHint) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyboardHint {
    /// Main menu
    Start,
    /// Study controls (next word, cancel)
    Study,
    /// One button per pair, plus "next" when `next_cursor` is set
    WordList {
        entries: Vec<WordListEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_cursor: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListEntry {
    pub id: i64,
    pub word: String,
}

impl KeyboardHint {
    /// Keyboard for one page of pairs; a full page may have a successor
    pub fn word_list(page: &[LearningPairWithId], page_size: usize) -> Self {
        let next_cursor = if page.len() == page_size {
            page.last().map(|p| p.id)
        } else {
            None
        };
        KeyboardHint::WordList {
            entries: page
                .iter()
                .map(|p| WordListEntry {
                    id: p.id,
                    word: p.pair.word.clone(),
                })
                .collect(),
            next_cursor,
        }
    }
}

//! Inputs that can drive a conversation step

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands a user can issue (usually via keyboard buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Start,
    Add,
    Remove,
    EditDefinition,
    GetWord,
    CheckWord,
    CheckNextWord,
    CheckDefinition,
    Cancel,
    ListWords,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::Start,
        Command::Add,
        Command::Remove,
        Command::EditDefinition,
        Command::GetWord,
        Command::CheckWord,
        Command::CheckNextWord,
        Command::CheckDefinition,
        Command::Cancel,
        Command::ListWords,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "START",
            Command::Add => "ADD",
            Command::Remove => "REMOVE",
            Command::EditDefinition => "EDIT_DEFINITION",
            Command::GetWord => "GET_WORD",
            Command::CheckWord => "CHECK_WORD",
            Command::CheckNextWord => "CHECK_NEXT_WORD",
            Command::CheckDefinition => "CHECK_DEFINITION",
            Command::Cancel => "CANCEL",
            Command::ListWords => "LIST_WORDS",
        }
    }

    /// Case-insensitive lookup by wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input delivered to the controller for one conversation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Free text typed by the user
    Text(String),
    /// Inline selection of a pair from a word list
    SelectPair { id: i64 },
    /// Next word-list page after `cursor`
    NextPage { cursor: i64 },
}

impl Input {
    pub fn trigger(&self) -> Trigger {
        match self {
            Input::Command(cmd) => Trigger::Command(*cmd),
            Input::Text(_) => Trigger::Text,
            Input::SelectPair { .. } => Trigger::SelectPair,
            Input::NextPage { .. } => Trigger::NextPage,
        }
    }
}

/// Input kind without its data; keys the admissibility table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Command(Command),
    Text,
    SelectPair,
    NextPage,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Command(cmd) => fmt::Display::fmt(cmd, f),
            Trigger::Text => f.write_str("TEXT"),
            Trigger::SelectPair => f.write_str("SELECT_PAIR"),
            Trigger::NextPage => f.write_str("NEXT_PAGE"),
        }
    }
}

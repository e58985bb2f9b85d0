//! Actions produced by state transitions

/// Fixed prompts that need no store access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    GreetAgain,
    WordToAdd,
    DefinitionToAdd,
    WordToRemove,
    WordToFind,
    WordToEdit,
    DefinitionToEdit,
    OkNext,
    /// Blank free text
    NotUnderstood,
}

/// Which half of a pair is shown openly during study
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiz {
    /// Show the word, hide the definition
    Word,
    /// Show the definition, hide the word
    Definition,
}

/// Action handler to run once a transition is admitted.
///
/// Each action performs at most one vocabulary store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Prompt(Prompt),
    CreatePair { word: String, definition: String },
    RemovePair { word: String },
    UpdateDefinition { word: String, definition: String },
    FindPair { word: String },
    RandomPair { quiz: Quiz },
    ListPage { cursor: i64 },
    ShowPair { id: i64 },
}

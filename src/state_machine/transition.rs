//! Pure state transition function
//!
//! Admissibility is a static table keyed by trigger. Given the same stored
//! state and input, `transition` always produces the same result and performs
//! no I/O.

use super::effect::{Action, Prompt, Quiz};
use super::event::{Command, Input, Trigger};
use super::state::{ConvState, StateTag, StoredState};
use super::validate::{self, PayloadMismatch};
use thiserror::Error;

const ALL_STATES: &[StateTag] = &StateTag::ALL;
const DEFAULT_ONLY: &[StateTag] = &[StateTag::Default];
const DEFAULT_OR_STUDY: &[StateTag] = &[StateTag::Default, StateTag::StudyMode];
const AWAITING_TEXT: &[StateTag] = &[
    StateTag::AwaitingWordToAdd,
    StateTag::AwaitingDefinitionToAdd,
    StateTag::AwaitingWordToRemove,
    StateTag::AwaitingWordToFind,
    StateTag::AwaitingWordToEdit,
    StateTag::AwaitingDefinitionToEdit,
];

/// Result of an admitted transition: the action to run and the planned state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub next: ConvState,
}

impl Transition {
    pub fn new(action: Action, next: ConvState) -> Self {
        Self { action, next }
    }

    fn prompt(prompt: Prompt, next: ConvState) -> Self {
        Self::new(Action::Prompt(prompt), next)
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{trigger} is not admissible from state {received} (expected one of {expected:?})")]
    Mismatch {
        trigger: Trigger,
        expected: &'static [StateTag],
        received: StateTag,
    },
    #[error(transparent)]
    Payload(#[from] PayloadMismatch),
}

/// States from which `trigger` is legal
pub fn admissible_states(trigger: Trigger) -> &'static [StateTag] {
    match trigger {
        Trigger::Command(Command::Start) | Trigger::SelectPair | Trigger::NextPage => ALL_STATES,
        Trigger::Command(
            Command::Add
            | Command::Remove
            | Command::EditDefinition
            | Command::GetWord
            | Command::ListWords,
        ) => DEFAULT_ONLY,
        Trigger::Command(
            Command::CheckWord
            | Command::CheckNextWord
            | Command::CheckDefinition
            | Command::Cancel,
        ) => DEFAULT_OR_STUDY,
        Trigger::Text => AWAITING_TEXT,
    }
}

fn mismatch(trigger: Trigger, received: StateTag) -> TransitionError {
    TransitionError::Mismatch {
        trigger,
        expected: admissible_states(trigger),
        received,
    }
}

/// Pure transition function.
///
/// Admissibility is checked on the stored tag first; only then is the payload
/// validated and decoded.
pub fn transition(stored: &StoredState, input: Input) -> Result<Transition, TransitionError> {
    let trigger = input.trigger();
    if !admissible_states(trigger).contains(&stored.tag) {
        return Err(mismatch(trigger, stored.tag));
    }

    let state = validate::decode(stored)?;

    match (state, input) {
        (_, Input::Command(Command::Start)) => {
            Ok(Transition::prompt(Prompt::GreetAgain, ConvState::Default))
        }

        (ConvState::Default, Input::Command(Command::Add)) => Ok(Transition::prompt(
            Prompt::WordToAdd,
            ConvState::AwaitingWordToAdd,
        )),
        (ConvState::Default, Input::Command(Command::Remove)) => Ok(Transition::prompt(
            Prompt::WordToRemove,
            ConvState::AwaitingWordToRemove,
        )),
        (ConvState::Default, Input::Command(Command::EditDefinition)) => Ok(Transition::prompt(
            Prompt::WordToEdit,
            ConvState::AwaitingWordToEdit,
        )),
        (ConvState::Default, Input::Command(Command::GetWord)) => Ok(Transition::prompt(
            Prompt::WordToFind,
            ConvState::AwaitingWordToFind,
        )),
        (ConvState::Default, Input::Command(Command::ListWords)) => Ok(Transition::new(
            Action::ListPage { cursor: 0 },
            ConvState::Default,
        )),

        (
            ConvState::Default | ConvState::StudyMode,
            Input::Command(Command::CheckWord | Command::CheckNextWord),
        ) => Ok(Transition::new(
            Action::RandomPair { quiz: Quiz::Word },
            ConvState::StudyMode,
        )),
        (ConvState::Default | ConvState::StudyMode, Input::Command(Command::CheckDefinition)) => {
            Ok(Transition::new(
                Action::RandomPair {
                    quiz: Quiz::Definition,
                },
                ConvState::StudyMode,
            ))
        }
        (ConvState::Default | ConvState::StudyMode, Input::Command(Command::Cancel)) => {
            Ok(Transition::prompt(Prompt::OkNext, ConvState::Default))
        }

        (state, Input::Text(text)) => text_transition(state, &text),

        // Inline selections leave the conversation where it is
        (state, Input::SelectPair { id }) => Ok(Transition::new(Action::ShowPair { id }, state)),
        (state, Input::NextPage { cursor }) => {
            Ok(Transition::new(Action::ListPage { cursor }, state))
        }

        (state, input) => Err(mismatch(input.trigger(), state.tag())),
    }
}

fn text_transition(state: ConvState, text: &str) -> Result<Transition, TransitionError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Transition::prompt(Prompt::NotUnderstood, state));
    }
    let text = text.to_string();

    let result = match state {
        ConvState::AwaitingWordToAdd => Transition::prompt(
            Prompt::DefinitionToAdd,
            ConvState::AwaitingDefinitionToAdd { word: text },
        ),
        ConvState::AwaitingDefinitionToAdd { word } => Transition::new(
            Action::CreatePair {
                word,
                definition: text,
            },
            ConvState::Default,
        ),
        ConvState::AwaitingWordToEdit => Transition::prompt(
            Prompt::DefinitionToEdit,
            ConvState::AwaitingDefinitionToEdit { word: text },
        ),
        ConvState::AwaitingDefinitionToEdit { word } => Transition::new(
            Action::UpdateDefinition {
                word,
                definition: text,
            },
            ConvState::Default,
        ),
        ConvState::AwaitingWordToFind => {
            Transition::new(Action::FindPair { word: text }, ConvState::Default)
        }
        ConvState::AwaitingWordToRemove => {
            Transition::new(Action::RemovePair { word: text }, ConvState::Default)
        }
        other @ (ConvState::Default | ConvState::StudyMode) => {
            return Err(mismatch(Trigger::Text, other.tag()));
        }
    };
    Ok(result)
}

//! Conversation controller
//!
//! One step is: load raw state, run the pure transition, execute the action
//! against the vocabulary store, commit the planned state. Every failure is
//! funnelled through a single error boundary that resets the user to
//! `default` so no conversation can get stuck. A lost commit race is the one
//! exception: the winner's state is left in place.

use super::error::{ControllerError, StoreError};
use super::reply::{self, KeyboardHint, Reply};
use super::traits::Storage;
use crate::db::LearningPairWithId;
use crate::state_machine::{
    transition, Action, ConvState, Input, Prompt, Quiz, StoredState, Transition,
};

/// Generic controller that can work with any storage implementation
pub struct Controller<S: Storage> {
    storage: S,
    page_size: usize,
}

impl<S: Storage> Controller<S> {
    pub fn new(storage: S, page_size: usize) -> Self {
        Self {
            storage,
            page_size: page_size.max(1),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Run one step for a resolved user. Never fails; errors become replies.
    pub async fn handle(&self, user_id: i64, input: Input) -> Reply {
        match self.step(user_id, input).await {
            Ok(reply) => reply,
            Err(err) => self.recover(user_id, &err).await,
        }
    }

    async fn step(&self, user_id: i64, input: Input) -> Result<Reply, ControllerError> {
        let stored = self.storage.load_state(user_id).await?;
        let trigger = input.trigger();

        let Transition { action, next } = transition(&stored, input)?;
        let (reply, next) = self.execute_action(user_id, action, next).await?;
        let next: StoredState = next.to_stored();

        self.storage
            .commit_state(user_id, stored.tag, &next)
            .await?;

        tracing::debug!(
            user_id,
            %trigger,
            from = %stored.tag,
            to = %next.tag,
            "Committed transition"
        );
        Ok(reply)
    }

    /// Perform the action's single store operation and build the reply.
    ///
    /// May override the planned state (empty vocabulary leaves study mode).
    async fn execute_action(
        &self,
        user_id: i64,
        action: Action,
        next: ConvState,
    ) -> Result<(Reply, ConvState), ControllerError> {
        let reply = match action {
            Action::Prompt(prompt) => prompt_reply(prompt, &next),

            Action::CreatePair { word, definition } => {
                self.storage
                    .create_pair(user_id, &word, &definition)
                    .await?;
                Reply::new(reply::WORD_ADD_OK).with_keyboard(KeyboardHint::Start)
            }

            Action::RemovePair { word } => {
                self.storage.remove_pair(user_id, &word).await?;
                Reply::new(reply::WORD_REMOVE_OK).with_keyboard(KeyboardHint::Start)
            }

            Action::UpdateDefinition { word, definition } => {
                self.storage
                    .update_definition(user_id, &word, &definition)
                    .await?;
                Reply::new(reply::DEFINITION_EDIT_OK).with_keyboard(KeyboardHint::Start)
            }

            Action::FindPair { word } => {
                let found = self.storage.get_exact_pair(user_id, &word).await?;
                pair_reply(found.as_ref()).with_keyboard(KeyboardHint::Start)
            }

            Action::ShowPair { id } => {
                let found = self.storage.get_pair_by_id(user_id, id).await?;
                pair_reply(found.as_ref())
            }

            Action::RandomPair { quiz } => {
                let Some(found) = self.storage.get_random_pair(user_id).await? else {
                    return Ok((
                        Reply::new(reply::NOTHING_TO_SHOW).with_keyboard(KeyboardHint::Start),
                        ConvState::Default,
                    ));
                };
                let LearningPairWithId { pair, .. } = found;
                let (shown, hidden) = match quiz {
                    Quiz::Word => (pair.word, pair.definition),
                    Quiz::Definition => (pair.definition, pair.word),
                };
                Reply::new(shown)
                    .with_spoiler(hidden)
                    .with_keyboard(KeyboardHint::Study)
            }

            Action::ListPage { cursor } => {
                let page = self
                    .storage
                    .list_pairs(user_id, cursor, self.page_size)
                    .await?;
                if page.is_empty() {
                    Reply::new(reply::NOTHING_TO_SHOW)
                } else {
                    Reply::new(reply::WORD_LIST)
                        .with_keyboard(KeyboardHint::word_list(&page, self.page_size))
                }
            }
        };
        Ok((reply, next))
    }

    /// The single error boundary: log by severity, reset, reply.
    async fn recover(&self, user_id: i64, err: &ControllerError) -> Reply {
        let mut reset = true;
        let text = match err {
            ControllerError::TransitionMismatch {
                trigger,
                expected,
                received,
            } => {
                tracing::warn!(
                    user_id,
                    %trigger,
                    state = %received,
                    expected = ?expected,
                    "Inadmissible input, resetting conversation"
                );
                reply::BAD_COMMAND
            }
            ControllerError::PayloadMismatch(mismatch) => {
                tracing::error!(
                    user_id,
                    state = %mismatch.state,
                    expected = %mismatch.expected,
                    actual = %mismatch.actual,
                    "Stored payload does not match its state"
                );
                reply::ERROR
            }
            ControllerError::DuplicateEntity => {
                tracing::info!(user_id, "Rejected duplicate word");
                reply::DUPLICATE_WORD
            }
            ControllerError::NotFound => {
                tracing::info!(user_id, "Word not found");
                reply::BAD_WORD
            }
            ControllerError::Storage(StoreError::StateConflict(_)) => {
                // Another writer committed first; resetting would clobber it
                tracing::warn!(user_id, "State changed during step, discarding stale commit");
                reset = false;
                reply::ERROR
            }
            ControllerError::Storage(e) => {
                tracing::error!(user_id, error = %e, "Storage failure during conversation step");
                reply::ERROR
            }
        };

        if reset {
            if let Err(e) = self.storage.reset_state(user_id).await {
                tracing::error!(user_id, error = %e, "Failed to reset conversation state");
            }
        }

        Reply::new(text).with_keyboard(KeyboardHint::Start)
    }
}

fn prompt_reply(prompt: Prompt, next: &ConvState) -> Reply {
    let text = match prompt {
        Prompt::GreetAgain => reply::GREET_REPEAT,
        Prompt::WordToAdd => reply::WORD_ADD_TYPE,
        Prompt::DefinitionToAdd => reply::DEFINITION_ADD_TYPE,
        Prompt::WordToRemove => reply::WORD_REMOVE_TYPE,
        Prompt::WordToFind => reply::WORD_FIND_TYPE,
        Prompt::WordToEdit => reply::WORD_EDIT_TYPE,
        Prompt::DefinitionToEdit => reply::DEFINITION_EDIT_TYPE,
        Prompt::OkNext => reply::OK_NEXT,
        Prompt::NotUnderstood => reply::NOT_UNDERSTOOD,
    };

    let reply = Reply::new(text);
    match next {
        ConvState::Default => reply.with_keyboard(KeyboardHint::Start),
        ConvState::StudyMode => reply.with_keyboard(KeyboardHint::Study),
        _ => reply,
    }
}

fn pair_reply(found: Option<&LearningPairWithId>) -> Reply {
    match found {
        Some(LearningPairWithId { pair, .. }) => {
            Reply::new(format!("{} - {}", pair.word, pair.definition))
        }
        None => Reply::new(reply::BAD_WORD),
    }
}

//! Core conversation state machine
//!
//! Pure transitions over typed per-user state. Persisted state is re-validated
//! on every step before any payload field is read.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;
pub mod validate;

#[cfg(test)]
mod proptests;

pub use effect::{Action, Prompt, Quiz};
pub use event::{Command, Input, Trigger};
pub use state::{ConvState, StateTag, StoredState};
#[allow(unused_imports)] // admissible_states is used by tests
pub use transition::{admissible_states, transition, Transition, TransitionError};
#[allow(unused_imports)] // Public API re-exports
pub use validate::{PayloadMismatch, PayloadShape};

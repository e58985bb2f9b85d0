//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::validate::{self, PayloadShape};
use super::*;
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_tag() -> impl Strategy<Value = StateTag> {
    proptest::sample::select(StateTag::ALL.to_vec())
}

fn arb_command() -> impl Strategy<Value = Command> {
    proptest::sample::select(Command::ALL.to_vec())
}

fn arb_word() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z ]{0,20}".prop_map(String::from)
}

fn arb_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        arb_command().prop_map(Input::Command),
        "[a-zA-Z ]{0,30}".prop_map(Input::Text),
        (0i64..1000).prop_map(|id| Input::SelectPair { id }),
        (0i64..1000).prop_map(|cursor| Input::NextPage { cursor }),
    ]
}

fn arb_conv_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Default),
        Just(ConvState::StudyMode),
        Just(ConvState::AwaitingWordToAdd),
        arb_word().prop_map(|word| ConvState::AwaitingDefinitionToAdd { word }),
        Just(ConvState::AwaitingWordToRemove),
        Just(ConvState::AwaitingWordToFind),
        Just(ConvState::AwaitingWordToEdit),
        arb_word().prop_map(|word| ConvState::AwaitingDefinitionToEdit { word }),
    ]
}

/// Any JSON value a corrupted `state_data` column might decode to
fn arb_payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z]{0,8}".prop_map(Value::String),
        arb_word().prop_map(|w| json!({ "word": w })),
        any::<i64>().prop_map(|n| json!({ "word": n })),
        arb_word().prop_map(|w| json!({ "ref": w })),
        Just(json!([])),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Inadmissible triggers are rejected as a mismatch whatever the payload holds
    #[test]
    fn prop_inadmissible_trigger_is_mismatch(
        tag in arb_tag(),
        payload in arb_payload(),
        input in arb_input(),
    ) {
        let trigger = input.trigger();
        prop_assume!(!admissible_states(trigger).contains(&tag));

        let result = transition(&StoredState::new(tag, payload), input);
        match result {
            Err(TransitionError::Mismatch { trigger: t, received, expected }) => {
                prop_assert_eq!(t, trigger);
                prop_assert_eq!(received, tag);
                prop_assert_eq!(expected, admissible_states(trigger));
            }
            other => prop_assert!(false, "expected mismatch, got {:?}", other),
        }
    }

    /// An admitted trigger over a corrupt payload never succeeds
    #[test]
    fn prop_corrupt_payload_is_never_trusted(
        tag in arb_tag(),
        payload in arb_payload(),
        input in arb_input(),
    ) {
        prop_assume!(admissible_states(input.trigger()).contains(&tag));
        prop_assume!(!validate::is_valid(tag, &payload));

        let result = transition(&StoredState::new(tag, payload), input);
        prop_assert!(matches!(result, Err(TransitionError::Payload(_))));
    }

    /// Every admitted transition plans a state whose payload matches its tag
    #[test]
    fn prop_next_state_payload_matches_tag(
        state in arb_conv_state(),
        input in arb_input(),
    ) {
        if let Ok(result) = transition(&state.to_stored(), input) {
            let next = result.next.to_stored();
            prop_assert!(validate::is_valid(next.tag, &next.payload));
            prop_assert_eq!(validate::decode(&next).unwrap(), result.next);
        }
    }

    /// Transition is a pure function of its inputs
    #[test]
    fn prop_transition_is_deterministic(
        state in arb_conv_state(),
        input in arb_input(),
    ) {
        let stored = state.to_stored();
        let first = transition(&stored, input.clone());
        let second = transition(&stored, input);
        prop_assert_eq!(first, second);
    }

    /// Completing a two-step flow always lands back in default
    #[test]
    fn prop_definition_step_returns_to_default(
        word in arb_word(),
        definition in arb_word(),
        editing in any::<bool>(),
    ) {
        let state = if editing {
            ConvState::AwaitingDefinitionToEdit { word: word.clone() }
        } else {
            ConvState::AwaitingDefinitionToAdd { word: word.clone() }
        };

        let result = transition(&state.to_stored(), Input::Text(definition.clone())).unwrap();
        prop_assert_eq!(result.next, ConvState::Default);

        let (stored_word, stored_definition) = match result.action {
            Action::CreatePair { word, definition } if !editing => (word, definition),
            Action::UpdateDefinition { word, definition } if editing => (word, definition),
            other => return Err(TestCaseError::fail(format!("unexpected action {other:?}"))),
        };
        prop_assert_eq!(stored_word, word);
        prop_assert_eq!(stored_definition, definition.trim());
    }

    /// Text is only ever accepted from the awaiting states
    #[test]
    fn prop_text_only_in_awaiting_states(
        tag in arb_tag(),
        text in "[a-z]{1,10}",
    ) {
        let payload = match validate::expected_shape(tag) {
            PayloadShape::Null => Value::Null,
            PayloadShape::Word => json!({ "word": "w" }),
        };
        let result = transition(&StoredState::new(tag, payload), Input::Text(text));
        let awaiting = !matches!(tag, StateTag::Default | StateTag::StudyMode);
        prop_assert_eq!(result.is_ok(), awaiting);
    }
}

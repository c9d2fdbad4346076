//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::adaptive::AdaptiveState;
use crate::assessment::Difficulty;
use crate::llm::testing::MockLlmService;
use crate::llm::ModelClient;
use crate::profiling::{assign_persona, Profile, ProfilingEngine, ProfilingEngineState, PROFILING_QUESTIONS};
use crate::report::{AssessmentReport, DimensionScore};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ConversationState> {
    prop_oneof![
        Just(ConversationState::Idle),
        Just(ConversationState::Profiling),
        Just(ConversationState::Active),
        Just(ConversationState::Ended),
    ]
}

fn arb_event() -> impl Strategy<Value = LifecycleEvent> {
    prop_oneof![
        Just(LifecycleEvent::Start),
        Just(LifecycleEvent::ProfilingCompleted),
        Just(LifecycleEvent::AdaptiveTurn),
        Just(LifecycleEvent::Finish),
    ]
}

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

fn arb_turn() -> impl Strategy<Value = Turn> {
    (any::<bool>(), ".{0,40}").prop_map(|(user, content)| {
        if user {
            Turn::user(content)
        } else {
            Turn::system(content)
        }
    })
}

fn arb_profile() -> impl Strategy<Value = Profile> {
    (
        proptest::option::of("[A-Za-z ]{0,20}"),
        proptest::option::of(".{0,30}"),
        proptest::option::of("[a-z0-9 ]{0,12}"),
    )
        .prop_map(|(candidate_name, role_focus, years_experience)| Profile {
            candidate_name,
            role_focus,
            years_experience,
        })
}

fn arb_engine_state() -> impl Strategy<Value = ProfilingEngineState> {
    (arb_profile(), any::<bool>(), 0usize..=3).prop_map(|(profile, complete, step)| {
        let persona = complete.then(|| assign_persona(&profile));
        ProfilingEngineState {
            profile,
            profiling_complete: complete,
            current_step: step,
            persona,
        }
    })
}

fn arb_adaptive_state() -> impl Strategy<Value = AdaptiveState> {
    (
        0u32..10,
        arb_difficulty(),
        prop::collection::vec("[a-z ]{1,12}", 0..4),
        prop::collection::vec("[a-z ]{1,12}", 0..4),
    )
        .prop_map(|(question_count, difficulty, strengths, weaknesses)| AdaptiveState {
            question_count,
            difficulty,
            observed_strengths: strengths,
            observed_weaknesses: weaknesses,
        })
}

fn arb_report() -> impl Strategy<Value = Option<AssessmentReport>> {
    proptest::option::of(("[a-zA-Z ]{0,30}", 1u8..=5, "[a-z ]{0,20}").prop_map(
        |(summary, score, justification)| AssessmentReport {
            profile_summary: summary,
            scores: [(
                "logical_thinking".to_string(),
                DimensionScore {
                    score,
                    justification,
                },
            )]
            .into_iter()
            .collect(),
            ..AssessmentReport::default()
        },
    ))
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        arb_state(),
        prop::collection::vec(arb_turn(), 0..8),
        arb_engine_state(),
        arb_adaptive_state(),
        arb_report(),
    )
        .prop_map(|(state, history, engine, adaptive, report)| Snapshot {
            state,
            history,
            profiling_engine_state: engine,
            adaptive_state: adaptive,
            report,
        })
}

fn test_machine(snapshot: Snapshot) -> (ConversationStateMachine, Arc<MockLlmService>) {
    let mock = Arc::new(MockLlmService::new("mock"));
    let machine = ConversationStateMachine::from_snapshot(snapshot, ModelClient::new(mock.clone()));
    (machine, mock)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_snapshot_roundtrip(snapshot in arb_snapshot()) {
        let json = snapshot.to_json().unwrap();
        let decoded = Snapshot::from_json(&json).unwrap();
        prop_assert_eq!(decoded, snapshot);
    }

    #[test]
    fn prop_machine_snapshot_is_lossless(snapshot in arb_snapshot()) {
        let (machine, _) = test_machine(snapshot.clone());
        prop_assert_eq!(machine.into_snapshot(), snapshot);
    }

    #[test]
    fn prop_transitions_never_go_backwards(state in arb_state(), event in arb_event()) {
        if let Ok(next) = transition(state, event) {
            prop_assert!(next.rank() >= state.rank());
        }
    }

    #[test]
    fn prop_ended_rejects_every_event(event in arb_event()) {
        prop_assert_eq!(
            transition(ConversationState::Ended, event),
            Err(TransitionError::Ended)
        );
    }

    #[test]
    fn prop_ended_ignores_input(snapshot in arb_snapshot(), input in ".{0,40}") {
        let mut snapshot = snapshot;
        snapshot.state = ConversationState::Ended;
        let (mut machine, mock) = test_machine(snapshot.clone());

        block_on(machine.handle_turn(&input));

        prop_assert_eq!(machine.into_snapshot(), snapshot);
        prop_assert!(mock.recorded_requests().is_empty());
    }

    #[test]
    fn prop_persona_is_pure(profile in arb_profile()) {
        prop_assert_eq!(assign_persona(&profile), assign_persona(&profile.clone()));
    }

    #[test]
    fn prop_profiling_completes_after_all_answers(
        answers in prop::collection::vec(".{0,30}", PROFILING_QUESTIONS.len())
    ) {
        let mut engine = ProfilingEngine::new();
        for (i, answer) in answers.iter().enumerate() {
            prop_assert!(!engine.is_complete());
            prop_assert!(engine.persona().is_none());
            prop_assert!(engine.record_answer(answer));
            prop_assert_eq!(engine.current_step(), i + 1);
        }
        prop_assert!(engine.is_complete());
        prop_assert_eq!(engine.persona().cloned(), Some(assign_persona(engine.profile())));
        prop_assert!(!engine.record_answer("extra"));
    }

    #[test]
    fn prop_turn_then_end_never_moves_backwards(
        snapshot in arb_snapshot(),
        input in "[a-zA-Z ]{0,20}",
    ) {
        let start = snapshot.state;
        let history = snapshot.history.clone();
        let (mut machine, _mock) = test_machine(snapshot);

        block_on(machine.handle_turn(&input));
        let after_turn = machine.state();
        block_on(machine.end());

        prop_assert!(after_turn.rank() >= start.rank());
        prop_assert!(machine.state().rank() >= after_turn.rank());
        if start == ConversationState::Idle {
            prop_assert_eq!(machine.state(), ConversationState::Idle);
            prop_assert_eq!(machine.history(), &history[..]);
        } else {
            prop_assert_eq!(machine.state(), ConversationState::Ended);
        }
    }

    #[test]
    fn prop_history_only_grows(
        answers in prop::collection::vec("[a-zA-Z0-9 ]{1,20}", 1..6)
    ) {
        let (mut machine, _mock) = test_machine(Snapshot::default());
        machine.start().unwrap();
        let mut previous = machine.history().to_vec();

        for answer in &answers {
            // Unqueued backend calls fail and come back as diagnostics
            let reply = block_on(machine.handle_turn(answer));
            prop_assert!(reply.history.len() >= previous.len());
            prop_assert_eq!(&reply.history[..previous.len()], &previous[..]);
            previous = reply.history;
        }
    }
}

//! Pure lifecycle transition function

use super::{ConversationState, LifecycleEvent};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Conversation has ended")]
    Ended,
    #[error("Invalid transition: {event:?} in {state}")]
    Invalid {
        state: ConversationState,
        event: LifecycleEvent,
    },
}

/// Next state for `event` in `state`.
///
/// Given the same inputs this always produces the same output, with no side
/// effects. Ended accepts nothing.
pub fn transition(
    state: ConversationState,
    event: LifecycleEvent,
) -> Result<ConversationState, TransitionError> {
    use ConversationState as S;
    use LifecycleEvent as E;

    match (state, event) {
        (S::Ended, _) => Err(TransitionError::Ended),

        (S::Idle, E::Start) => Ok(S::Profiling),
        (S::Profiling, E::ProfilingCompleted) => Ok(S::Active),
        (S::Active, E::AdaptiveTurn) => Ok(S::Active),
        (S::Profiling | S::Active, E::Finish) => Ok(S::Ended),

        (state, event) => Err(TransitionError::Invalid { state, event }),
    }
}

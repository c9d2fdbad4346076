//! Conversation state machine
//!
//! Lifecycle transitions are a pure function; the orchestrator in
//! [`machine`] applies them around the profiling and adaptive steps.

pub mod event;
pub mod machine;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use event::LifecycleEvent;
pub use machine::{is_exit_keyword, ConversationError, ConversationStateMachine};
pub use state::{ConversationState, Role, Snapshot, Turn, TurnReply};
pub use transition::{transition, TransitionError};

//! Lifecycle events that move a conversation between states

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Caller opened the conversation
    Start,
    /// Last profiling answer recorded, persona assigned
    ProfilingCompleted,
    /// An answer in the interview proper
    AdaptiveTurn,
    /// Exit keyword or question budget spent
    Finish,
}

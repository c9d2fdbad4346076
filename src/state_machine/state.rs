//! Conversation state and its persisted snapshot

use crate::adaptive::AdaptiveState;
use crate::profiling::ProfilingEngineState;
use crate::report::AssessmentReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation lifecycle: Idle -> Profiling -> Active -> Ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    #[default]
    Idle,
    Profiling,
    Active,
    Ended,
}

impl ConversationState {
    /// Position along the lifecycle, used to check monotonic progress
    pub fn rank(self) -> u8 {
        match self {
            ConversationState::Idle => 0,
            ConversationState::Profiling => 1,
            ConversationState::Active => 2,
            ConversationState::Ended => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConversationState::Ended)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationState::Idle => "IDLE",
            ConversationState::Profiling => "PROFILING",
            ConversationState::Active => "ACTIVE",
            ConversationState::Ended => "ENDED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
}

/// One history entry; never modified once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Complete persisted form of a conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: ConversationState,
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub profiling_engine_state: ProfilingEngineState,
    #[serde(default)]
    pub adaptive_state: AdaptiveState,
    /// Set once the conversation has ended; empty if generation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<AssessmentReport>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What a turn hands back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub message: String,
    pub history: Vec<Turn>,
}

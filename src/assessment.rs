//! Assessment vocabulary shared by profiling and the adaptive controller

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Read a 1..=5 score from a number or numeric string, rounded and clamped
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn lenient_score(value: &Value) -> Option<u8> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite())
        // Clamped into 1..=5 first, so the cast is exact
        .map(|n| n.round().clamp(1.0, 5.0) as u8)
}

/// Question difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Medium goes up to Hard; Hard and Easy both fall back to Medium.
    ///
    /// There is no Easy -> Hard step: difficulty oscillates around Medium.
    #[must_use]
    pub fn increased(self) -> Self {
        match self {
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Easy | Difficulty::Hard => Difficulty::Medium,
        }
    }

    /// Medium goes down to Easy; Easy and Hard both return to Medium.
    #[must_use]
    pub fn decreased(self) -> Self {
        match self {
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Easy | Difficulty::Hard => Difficulty::Medium,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Skill dimension a question targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "Logical Thinking")]
    LogicalThinking,
    Communication,
    Adaptability,
}

impl Dimension {
    /// Fixed rotation order
    pub const ALL: [Dimension; 3] = [
        Dimension::LogicalThinking,
        Dimension::Communication,
        Dimension::Adaptability,
    ];

    /// Dimension for a question counter value (`counter mod 3`)
    pub fn for_counter(counter: u32) -> Self {
        Self::ALL[(counter % 3) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::LogicalThinking => "Logical Thinking",
            Dimension::Communication => "Communication",
            Dimension::Adaptability => "Adaptability",
        }
    }

    /// `snake_case` key used in report score maps
    pub fn report_key(self) -> &'static str {
        match self {
            Dimension::LogicalThinking => "logical_thinking",
            Dimension::Communication => "communication",
            Dimension::Adaptability => "adaptability",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

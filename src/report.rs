//! End-of-interview assessment report

use crate::assessment::{lenient_score, Dimension};
use crate::llm::JsonMap;
use crate::state_machine::{Role, Turn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// 1..=5; 0 when the model gave nothing numeric
    #[serde(default, deserialize_with = "score_from_any")]
    pub score: u8,
    #[serde(default)]
    pub justification: String,
}

fn score_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_score(&value).unwrap_or_default())
}

/// Structured report produced by the model at the end of an interview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentReport {
    #[serde(default)]
    pub profile_summary: String,
    /// Keyed by dimension report key, e.g. `logical_thinking`
    #[serde(default)]
    pub scores: BTreeMap<String, DimensionScore>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
    #[serde(default)]
    pub behavioral_traits: Vec<String>,
    #[serde(default)]
    pub overall_recommendation: String,
}

impl AssessmentReport {
    /// `None` when the model produced nothing usable
    pub fn from_map(map: JsonMap) -> Option<Self> {
        if map.is_empty() {
            return None;
        }
        match serde_json::from_value(Value::Object(map)) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "Report JSON did not match the expected shape");
                None
            }
        }
    }

    /// Plain-text summary appended to the conversation history
    pub fn summary(&self) -> String {
        let mut out = String::from("--- ASSESSMENT REPORT ---\n");
        let _ = writeln!(out, "Summary: {}", self.profile_summary);

        out.push_str("\nScores:\n");
        let known = Dimension::ALL
            .iter()
            .filter_map(|d| Some((d.label().to_string(), self.scores.get(d.report_key())?)));
        let extra = self
            .scores
            .iter()
            .filter(|(key, _)| !Dimension::ALL.iter().any(|d| d.report_key() == key.as_str()))
            .map(|(key, entry)| (title_case(key), entry));
        for (label, entry) in known.chain(extra) {
            let _ = writeln!(out, "- {label}: {}/5 ({})", entry.score, entry.justification);
        }

        let _ = writeln!(out, "\nStrengths: {}", self.strengths.join(", "));
        let _ = writeln!(out, "Areas for Improvement: {}", self.improvement_areas.join(", "));
        if !self.behavioral_traits.is_empty() {
            let _ = writeln!(out, "Behavioral Traits: {}", self.behavioral_traits.join(", "));
        }
        let _ = write!(out, "\nOverall Recommendation: {}", self.overall_recommendation);
        out
    }
}

/// `logical_thinking` -> `Logical Thinking`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render turns as an interviewer/candidate transcript
pub fn render_transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::System => "Interviewer",
                Role::User => "Candidate",
            };
            format!("{speaker}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

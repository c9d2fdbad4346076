//! Adaptive interview controller
//!
//! Each active turn asks the model to analyse the last answer, adjusts
//! difficulty and topic from the suggested action, and requests the next
//! question. The controller borrows its state for one turn only.

use crate::assessment::{lenient_score, Difficulty, Dimension};
use crate::llm::{JsonMap, ModelClient, TemplateVars};
use crate::profiling::PersonaRecord;
use crate::prompts::{ANALYSIS_TEMPLATE, QUESTION_TEMPLATE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Questions asked before the interview wraps up
pub const MAX_QUESTIONS: u32 = 5;

/// Distinct strengths/weaknesses surfaced to the question prompt
const SIGNAL_PREVIEW: usize = 3;

const INSTRUCTION_CONTINUE: &str = "Continue with the interview flow.";
const INSTRUCTION_HARDER: &str = "Candidate is doing well. Increase complexity or add constraints.";
const INSTRUCTION_EASIER: &str = "Candidate is struggling. Simplify the question or guide them.";
const INSTRUCTION_PROBE: &str = "Candidate's answer was surface level or vague. Ask a follow-up \
question on the same dimension to dig deeper. Do not switch topics yet.";
const INSTRUCTION_OPENING: &str = "Start with a simple question relevant to the persona.";

/// Action the analysis step recommends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestedAction {
    IncreaseDifficulty,
    DecreaseDifficulty,
    MaintainDifficulty,
    ProbeDeeper,
    /// Anything the model invents
    Unknown(String),
}

impl SuggestedAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "increase_difficulty" => Self::IncreaseDifficulty,
            "decrease_difficulty" => Self::DecreaseDifficulty,
            "maintain_difficulty" => Self::MaintainDifficulty,
            "probe_deeper" => Self::ProbeDeeper,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Model assessment of one answer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisSignal {
    pub quality_score: Option<u8>,
    pub observed_strengths: Vec<String>,
    pub observed_weaknesses: Vec<String>,
    pub suggested_action: Option<SuggestedAction>,
}

impl AnalysisSignal {
    /// Read a signal leniently from model JSON; an empty map is no signal.
    pub fn from_map(map: &JsonMap) -> Option<Self> {
        if map.is_empty() {
            return None;
        }

        Some(Self {
            quality_score: map.get("quality_score").and_then(lenient_score),
            observed_strengths: string_list(map.get("observed_strengths")),
            observed_weaknesses: string_list(map.get("observed_weaknesses")),
            suggested_action: map
                .get("suggested_action")
                .and_then(Value::as_str)
                .map(SuggestedAction::parse),
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// First `limit` distinct entries, joined for a prompt
fn distinct_preview(items: &[String], limit: usize) -> String {
    let mut seen: Vec<&str> = Vec::with_capacity(limit);
    for item in items {
        if seen.len() == limit {
            break;
        }
        if !seen.contains(&item.as_str()) {
            seen.push(item);
        }
    }
    if seen.is_empty() {
        "None yet".to_string()
    } else {
        seen.join(", ")
    }
}

/// Adaptive progress persisted across turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveState {
    #[serde(default)]
    pub question_count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Raw accumulation, duplicates kept
    #[serde(default)]
    pub observed_strengths: Vec<String>,
    #[serde(default)]
    pub observed_weaknesses: Vec<String>,
}

/// How a signal moves the interview forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPlan {
    pub advance_topic: bool,
    pub instruction: &'static str,
}

impl AdaptiveState {
    /// Fold one analysis signal into the state.
    ///
    /// Only `probe_deeper` holds the counter; every other outcome, including
    /// no signal at all, advances it by one.
    pub fn apply_signal(&mut self, signal: Option<&AnalysisSignal>) -> TurnPlan {
        let mut plan = TurnPlan {
            advance_topic: true,
            instruction: INSTRUCTION_CONTINUE,
        };

        if let Some(signal) = signal {
            self.observed_strengths
                .extend(signal.observed_strengths.iter().cloned());
            self.observed_weaknesses
                .extend(signal.observed_weaknesses.iter().cloned());

            match &signal.suggested_action {
                Some(SuggestedAction::IncreaseDifficulty) => {
                    self.difficulty = self.difficulty.increased();
                    plan.instruction = INSTRUCTION_HARDER;
                }
                Some(SuggestedAction::DecreaseDifficulty) => {
                    self.difficulty = self.difficulty.decreased();
                    plan.instruction = INSTRUCTION_EASIER;
                }
                Some(SuggestedAction::ProbeDeeper) => {
                    plan.advance_topic = false;
                    plan.instruction = INSTRUCTION_PROBE;
                }
                Some(SuggestedAction::MaintainDifficulty | SuggestedAction::Unknown(_)) | None => {}
            }
        }

        if plan.advance_topic {
            self.question_count += 1;
        }
        plan
    }

    pub fn budget_exhausted(&self) -> bool {
        self.question_count > MAX_QUESTIONS
    }

    /// Dimension for the question about to be asked
    pub fn target_dimension(&self) -> Dimension {
        Dimension::for_counter(self.question_count)
    }

    pub fn strengths_preview(&self) -> String {
        distinct_preview(&self.observed_strengths, SIGNAL_PREVIEW)
    }

    pub fn weaknesses_preview(&self) -> String {
        distinct_preview(&self.observed_weaknesses, SIGNAL_PREVIEW)
    }
}

/// Result of an active turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptiveOutcome {
    /// Next question text to show the candidate
    Question(String),
    /// The question budget is spent; the conversation should end
    BudgetExhausted,
}

/// Per-turn controller over borrowed state
pub struct AdaptiveController<'a> {
    client: &'a ModelClient,
    persona: &'a PersonaRecord,
    state: &'a mut AdaptiveState,
}

impl<'a> AdaptiveController<'a> {
    pub fn new(
        client: &'a ModelClient,
        persona: &'a PersonaRecord,
        state: &'a mut AdaptiveState,
    ) -> Self {
        Self {
            client,
            persona,
            state,
        }
    }

    /// Reset for a fresh interview and generate its first question
    pub async fn opening_question(&mut self) -> String {
        *self.state = AdaptiveState {
            question_count: 1,
            difficulty: self.persona.start_difficulty,
            ..AdaptiveState::default()
        };

        let vars = self
            .question_vars(
                Dimension::LogicalThinking,
                "I am ready to begin.",
                INSTRUCTION_OPENING,
            )
            .with("strengths", "Not yet observed")
            .with("weaknesses", "Not yet observed");

        self.client.generate_content(QUESTION_TEMPLATE, &vars).await
    }

    /// Analyse `answer` to `previous_question`, adapt, and produce the next step
    pub async fn run_turn(&mut self, previous_question: &str, answer: &str) -> AdaptiveOutcome {
        let signal = self.analyze(previous_question, answer).await;
        let plan = self.state.apply_signal(signal.as_ref());

        tracing::info!(
            question_count = self.state.question_count,
            difficulty = %self.state.difficulty,
            advance = plan.advance_topic,
            action = ?signal.as_ref().and_then(|s| s.suggested_action.as_ref()),
            quality = ?signal.as_ref().and_then(|s| s.quality_score),
            "Adaptive turn planned"
        );

        if self.state.budget_exhausted() {
            return AdaptiveOutcome::BudgetExhausted;
        }

        let vars = self.question_vars(self.state.target_dimension(), answer, plan.instruction);
        AdaptiveOutcome::Question(self.client.generate_content(QUESTION_TEMPLATE, &vars).await)
    }

    async fn analyze(&self, previous_question: &str, answer: &str) -> Option<AnalysisSignal> {
        let vars = TemplateVars::new()
            .with("persona_name", self.persona.summary())
            .with("difficulty", self.state.difficulty)
            .with("last_question", previous_question)
            .with("user_response", answer);

        let map = self.client.generate_json(ANALYSIS_TEMPLATE, &vars).await;
        let signal = AnalysisSignal::from_map(&map);
        if signal.is_none() {
            tracing::warn!("No analysis signal for answer, advancing by default");
        }
        signal
    }

    fn question_vars(&self, dimension: Dimension, last_answer: &str, instruction: &str) -> TemplateVars {
        TemplateVars::new()
            .with("persona_context", self.persona.context())
            .with("persona_name", &self.persona.persona_name)
            .with("target_users", &self.persona.target_users)
            .with("expected_skills", self.persona.expected_skills.join(", "))
            .with("struggles", self.persona.struggles.join(", "))
            .with("start_difficulty", self.persona.start_difficulty)
            .with("max_difficulty", self.persona.max_difficulty)
            .with("education", &self.persona.education)
            .with("experience_level", &self.persona.experience_level)
            .with("domain_exposure", self.persona.domain_exposure())
            .with("target_dimension", dimension)
            .with("last_answer", last_answer)
            .with("strengths", self.state.strengths_preview())
            .with("weaknesses", self.state.weaknesses_preview())
            .with("difficulty", self.state.difficulty)
            .with("adaptive_instruction", instruction)
    }
}

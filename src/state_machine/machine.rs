//! Conversation orchestrator
//!
//! Rebuilt from a [`Snapshot`] for every turn. Dispatches input to the
//! profiling engine or the adaptive controller and drives report generation
//! when the interview ends. Turn handling never fails: backend problems end up
//! as text in the reply.

use super::state::{ConversationState, Snapshot, Turn, TurnReply};
use super::transition::transition;
use super::LifecycleEvent;
use crate::adaptive::{AdaptiveController, AdaptiveOutcome, AdaptiveState};
use crate::llm::{ModelClient, TemplateVars};
use crate::profiling::{assign_persona, PersonaRecord, ProfilingEngine};
use crate::prompts::REPORT_TEMPLATE;
use crate::report::{render_transcript, AssessmentReport};
use thiserror::Error;

const WELCOME: &str = "Hello! I am your AI Interviewer. To tailor this assessment for you, \
I need to ask a few setting-the-stage questions.";
pub const ENDED_MESSAGE: &str =
    "The conversation has ended. Please refresh to start a new assessment.";
pub const NOT_STARTED_MESSAGE: &str =
    "The conversation has not started yet. Start a new assessment first.";
const CLOSING: &str =
    "Thank you for your time. The assessment is complete. Generating your feedback report...";
const REPORT_FAILED: &str = "(Report generation failed due to an error).";

const EXIT_KEYWORDS: &[&str] = &["bye", "exit", "quit"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Conversation already started (state {0})")]
    AlreadyStarted(ConversationState),
}

/// Trimmed, case-insensitive match against the exit keywords
pub fn is_exit_keyword(input: &str) -> bool {
    let input = input.trim();
    EXIT_KEYWORDS.iter().any(|k| input.eq_ignore_ascii_case(k))
}

pub struct ConversationStateMachine {
    client: ModelClient,
    state: ConversationState,
    history: Vec<Turn>,
    profiling: ProfilingEngine,
    adaptive: AdaptiveState,
    report: Option<AssessmentReport>,
}

impl ConversationStateMachine {
    pub fn new(client: ModelClient) -> Self {
        Self::from_snapshot(Snapshot::default(), client)
    }

    pub fn from_snapshot(snapshot: Snapshot, client: ModelClient) -> Self {
        Self {
            client,
            state: snapshot.state,
            history: snapshot.history,
            profiling: ProfilingEngine::from_state(snapshot.profiling_engine_state),
            adaptive: snapshot.adaptive_state,
            report: snapshot.report,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            history: self.history.clone(),
            profiling_engine_state: self.profiling.state().clone(),
            adaptive_state: self.adaptive.clone(),
            report: self.report.clone(),
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        Snapshot {
            state: self.state,
            history: self.history,
            profiling_engine_state: self.profiling.into_state(),
            adaptive_state: self.adaptive,
            report: self.report,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn report(&self) -> Option<&AssessmentReport> {
        self.report.as_ref()
    }

    /// Open the conversation with the welcome line and first profiling question
    pub fn start(&mut self) -> Result<String, ConversationError> {
        if self.state != ConversationState::Idle {
            return Err(ConversationError::AlreadyStarted(self.state));
        }
        self.advance(LifecycleEvent::Start);

        let message = match self.profiling.next_question() {
            Some(question) => format!("{WELCOME}\n\n{question}"),
            None => WELCOME.to_string(),
        };
        self.push_system(&message);
        Ok(message)
    }

    /// Process one line of candidate input
    pub async fn handle_turn(&mut self, input: &str) -> TurnReply {
        let message = match self.state {
            ConversationState::Ended => ENDED_MESSAGE.to_string(),
            ConversationState::Idle => NOT_STARTED_MESSAGE.to_string(),
            state => {
                self.history.push(Turn::user(input));
                if is_exit_keyword(input) {
                    tracing::info!("Exit keyword received");
                    self.end().await
                } else if state == ConversationState::Profiling {
                    self.handle_profiling(input).await
                } else {
                    self.handle_active(input).await
                }
            }
        };

        TurnReply {
            message,
            history: self.history.clone(),
        }
    }

    async fn handle_profiling(&mut self, input: &str) -> String {
        if !self.profiling.record_answer(input) {
            // Profiling finished in an earlier turn but the state was never advanced
            self.advance(LifecycleEvent::ProfilingCompleted);
            return self.handle_active(input).await;
        }

        if let Some(question) = self.profiling.next_question() {
            self.push_system(question);
            return question.to_string();
        }

        self.advance(LifecycleEvent::ProfilingCompleted);
        let persona = self.persona();
        let question = AdaptiveController::new(&self.client, &persona, &mut self.adaptive)
            .opening_question()
            .await;

        let message = format!(
            "Thank you, {}. Based on your profile, I will be conducting a {} interview.\n\
             Let's begin.\n\n{question}",
            self.profiling.profile().candidate_name_or_default(),
            persona.persona_name,
        );
        self.push_system(&message);
        message
    }

    async fn handle_active(&mut self, input: &str) -> String {
        let previous_question = self.last_system_turn().to_string();
        let persona = self.persona();
        let outcome = AdaptiveController::new(&self.client, &persona, &mut self.adaptive)
            .run_turn(&previous_question, input)
            .await;

        match outcome {
            AdaptiveOutcome::Question(question) => {
                self.advance(LifecycleEvent::AdaptiveTurn);
                self.push_system(&question);
                question
            }
            AdaptiveOutcome::BudgetExhausted => {
                tracing::info!(
                    question_count = self.adaptive.question_count,
                    "Question budget spent"
                );
                self.end().await
            }
        }
    }

    /// End the interview and generate the assessment report.
    ///
    /// Leaves a started conversation Ended. A report that cannot be produced
    /// is stored empty and an apology is appended instead of the summary.
    /// An Idle conversation is left untouched.
    pub async fn end(&mut self) -> String {
        match self.state {
            ConversationState::Ended => return ENDED_MESSAGE.to_string(),
            ConversationState::Idle => return NOT_STARTED_MESSAGE.to_string(),
            ConversationState::Profiling | ConversationState::Active => {}
        }
        self.advance(LifecycleEvent::Finish);
        self.push_system(CLOSING);

        let profile = self.profiling.profile();
        let persona_name = self
            .profiling
            .persona()
            .map_or_else(|| "Interviewer (Neutral)".to_string(), PersonaRecord::summary);
        let vars = TemplateVars::new()
            .with("candidate_name", profile.candidate_name_or_default())
            .with("persona_name", persona_name)
            .with("background", profile.background())
            .with("full_conversation", render_transcript(&self.history));

        let map = self.client.generate_json(REPORT_TEMPLATE, &vars).await;
        match AssessmentReport::from_map(map) {
            Some(report) => {
                let summary = report.summary();
                self.push_system(&summary);
                self.report = Some(report);
                format!("{CLOSING}\n\n{summary}")
            }
            None => {
                tracing::warn!("Report generation failed, storing empty report");
                self.push_system(REPORT_FAILED);
                self.report = Some(AssessmentReport::default());
                format!("{CLOSING}\n{REPORT_FAILED}")
            }
        }
    }

    /// Callers only raise events that are valid for the current state.
    fn advance(&mut self, event: LifecycleEvent) {
        let result = transition(self.state, event);
        debug_assert!(
            result.is_ok(),
            "{event:?} raised in state {}",
            self.state
        );
        match result {
            Ok(next) => {
                if next != self.state {
                    tracing::info!(from = %self.state, to = %next, ?event, "State transition");
                }
                self.state = next;
            }
            Err(e) => tracing::warn!(state = %self.state, ?event, error = %e, "Transition rejected"),
        }
    }

    fn push_system(&mut self, content: &str) {
        self.history.push(Turn::system(content));
    }

    /// The interviewer's most recent message
    fn last_system_turn(&self) -> &str {
        self.history
            .iter()
            .rev()
            .find(|t| t.role == super::Role::System)
            .map_or("", |t| t.content.as_str())
    }

    /// Persona for the interview proper; derived on the spot if a snapshot lost it
    fn persona(&self) -> PersonaRecord {
        self.profiling
            .persona()
            .cloned()
            .unwrap_or_else(|| assign_persona(self.profiling.profile()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::MAX_QUESTIONS;
    use crate::assessment::Difficulty;
    use crate::llm::testing::MockLlmService;
    use crate::llm::{LlmError, DIAGNOSTIC_PREFIX};
    use crate::profiling::{Domain, Seniority, PROFILING_QUESTIONS};
    use crate::state_machine::Role;
    use serde_json::json;
    use std::sync::Arc;

    fn machine() -> (ConversationStateMachine, Arc<MockLlmService>) {
        let mock = Arc::new(MockLlmService::new("mock"));
        let machine = ConversationStateMachine::new(ModelClient::new(mock.clone()));
        (machine, mock)
    }

    fn report_json() -> serde_json::Value {
        json!({
            "profile_summary": "Thoughtful engineer.",
            "scores": {"communication": {"score": 4, "justification": "Clear"}},
            "strengths": ["Clarity"],
            "improvement_areas": ["Depth"],
            "behavioral_traits": ["analytical"],
            "overall_recommendation": "Advance"
        })
    }

    async fn profile(machine: &mut ConversationStateMachine, mock: &MockLlmService) -> TurnReply {
        machine.start().unwrap();
        machine.handle_turn("Alice").await;
        machine.handle_turn("Python Backend").await;
        mock.queue_text("Design a rate limiter.");
        machine.handle_turn("6 years").await
    }

    #[test]
    fn test_start_emits_welcome_and_first_question() {
        let (mut machine, _) = machine();
        let message = machine.start().unwrap();
        assert!(message.starts_with(WELCOME));
        assert!(message.ends_with(PROFILING_QUESTIONS[0].text));
        assert_eq!(machine.state(), ConversationState::Profiling);
        assert_eq!(machine.history(), &[Turn::system(message)]);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (mut machine, _) = machine();
        machine.start().unwrap();
        let before = machine.snapshot();
        assert_eq!(
            machine.start(),
            Err(ConversationError::AlreadyStarted(ConversationState::Profiling))
        );
        assert_eq!(machine.snapshot(), before);
    }

    #[tokio::test]
    async fn test_idle_input_not_started() {
        let (mut machine, mock) = machine();
        let reply = machine.handle_turn("hello").await;
        assert_eq!(reply.message, NOT_STARTED_MESSAGE);
        assert!(reply.history.is_empty());
        assert_eq!(machine.state(), ConversationState::Idle);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_end_before_start_is_a_no_op() {
        let (mut machine, mock) = machine();
        let before = machine.snapshot();

        assert_eq!(machine.end().await, NOT_STARTED_MESSAGE);

        assert_eq!(machine.state(), ConversationState::Idle);
        assert_eq!(machine.snapshot(), before);
        assert!(machine.report().is_none());
        assert!(mock.recorded_requests().is_empty());
        assert!(machine.start().is_ok(), "still startable");
    }

    #[tokio::test]
    async fn test_profiling_flow_assigns_senior_backend() {
        let (mut machine, mock) = machine();
        let reply = profile(&mut machine, &mock).await;

        assert_eq!(machine.state(), ConversationState::Active);
        assert!(reply.message.starts_with(
            "Thank you, Alice. Based on your profile, I will be conducting a \
             Senior Backend Engineering Interviewer interview.\nLet's begin."
        ));
        assert!(reply.message.ends_with("Design a rate limiter."));

        let snapshot = machine.snapshot();
        let persona = snapshot.profiling_engine_state.persona.unwrap();
        assert_eq!(persona.seniority, Seniority::Senior);
        assert_eq!(persona.domain, Domain::Backend);
        assert_eq!(snapshot.adaptive_state.question_count, 1);
        assert_eq!(snapshot.adaptive_state.difficulty, Difficulty::Hard);

        // welcome, 3 answers, 2 follow-up questions, transition
        assert_eq!(snapshot.history.len(), 7);
        assert_eq!(mock.recorded_prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_active_turn_asks_next_question() {
        let (mut machine, mock) = machine();
        profile(&mut machine, &mock).await;

        mock.queue_json(&json!({"quality_score": 3, "suggested_action": "maintain_difficulty"}));
        mock.queue_text("How would you shard it?");
        let reply = machine.handle_turn("Token bucket per user.").await;

        assert_eq!(reply.message, "How would you shard it?");
        assert_eq!(machine.state(), ConversationState::Active);
        assert_eq!(machine.snapshot().adaptive_state.question_count, 2);
        let last = reply.history.last().unwrap();
        assert_eq!(last.role, Role::System);
        assert_eq!(last.content, "How would you shard it?");

        let prompts = mock.recorded_prompts();
        assert!(prompts[1].contains("Design a rate limiter."));
        assert!(prompts[1].contains("Token bucket per user."));
    }

    #[tokio::test]
    async fn test_exit_keyword_any_case_ends() {
        for keyword in ["bye", "  EXIT ", "Quit"] {
            let (mut machine, mock) = machine();
            machine.start().unwrap();
            mock.queue_json(&report_json());

            let reply = machine.handle_turn(keyword).await;

            assert_eq!(machine.state(), ConversationState::Ended);
            assert!(reply.message.starts_with(CLOSING));
            assert!(reply.message.contains("--- ASSESSMENT REPORT ---"));
            assert_eq!(
                machine.report().map(|r| r.overall_recommendation.as_str()),
                Some("Advance")
            );
            // No persona yet: profiling never finished
            assert!(machine.snapshot().profiling_engine_state.persona.is_none());
        }
    }

    #[tokio::test]
    async fn test_report_prompt_carries_transcript() {
        let (mut machine, mock) = machine();
        profile(&mut machine, &mock).await;
        mock.queue_json(&report_json());

        machine.handle_turn("bye").await;

        let prompts = mock.recorded_prompts();
        let report_prompt = prompts.last().unwrap();
        assert!(report_prompt.contains("Candidate: Alice"));
        assert!(report_prompt.contains("Background: Python Backend with 6 years years"));
        assert!(report_prompt.contains("Interviewer: Hello! I am your AI Interviewer."));
        assert!(report_prompt.contains("Candidate: bye"));
        assert!(report_prompt.contains(&format!("Interviewer: {CLOSING}")));
    }

    #[tokio::test]
    async fn test_fractional_report_scores_keep_recommendation() {
        let (mut machine, mock) = machine();
        machine.start().unwrap();
        mock.queue_json(&json!({
            "scores": {"logical_thinking": {"score": 4.5, "justification": "Sharp"}},
            "overall_recommendation": "Hire"
        }));

        let reply = machine.handle_turn("bye").await;

        assert!(reply.message.contains("- Logical Thinking: 5/5 (Sharp)"));
        assert!(reply.message.ends_with("Overall Recommendation: Hire"));
        assert!(!reply.message.contains(REPORT_FAILED));
    }

    #[tokio::test]
    async fn test_report_failure_appends_apology() {
        let (mut machine, mock) = machine();
        machine.start().unwrap();
        mock.queue_error(LlmError::server_error("down"));

        let reply = machine.handle_turn("quit").await;

        assert_eq!(machine.state(), ConversationState::Ended);
        assert_eq!(reply.message, format!("{CLOSING}\n{REPORT_FAILED}"));
        assert_eq!(reply.history.last().unwrap().content, REPORT_FAILED);
        assert_eq!(machine.report(), Some(&AssessmentReport::default()));
    }

    #[tokio::test]
    async fn test_ended_is_absorbing() {
        let (mut machine, mock) = machine();
        machine.start().unwrap();
        mock.queue_json(&report_json());
        machine.handle_turn("bye").await;
        let before = machine.snapshot();
        let calls = mock.recorded_requests().len();

        let reply = machine.handle_turn("hello again").await;

        assert_eq!(reply.message, ENDED_MESSAGE);
        assert_eq!(machine.snapshot(), before);
        assert_eq!(mock.recorded_requests().len(), calls);
        assert_eq!(machine.end().await, ENDED_MESSAGE);
    }

    #[tokio::test]
    async fn test_budget_forces_end() {
        let (mut machine, mock) = machine();
        profile(&mut machine, &mock).await;

        for n in 2..=MAX_QUESTIONS {
            mock.queue_json(&json!({"suggested_action": "maintain_difficulty"}));
            mock.queue_text(format!("Question {n}"));
            let reply = machine.handle_turn("answer").await;
            assert_eq!(reply.message, format!("Question {n}"));
        }
        assert_eq!(machine.snapshot().adaptive_state.question_count, MAX_QUESTIONS);

        mock.queue_json(&json!({"suggested_action": "maintain_difficulty"}));
        mock.queue_json(&report_json());
        let reply = machine.handle_turn("last answer").await;

        assert_eq!(machine.state(), ConversationState::Ended);
        assert!(reply.message.starts_with(CLOSING));
        assert_eq!(mock.pending(), 0);
    }

    #[tokio::test]
    async fn test_probe_holds_counter() {
        let (mut machine, mock) = machine();
        profile(&mut machine, &mock).await;

        mock.queue_json(&json!({"suggested_action": "probe_deeper"}));
        mock.queue_text("Can you give a concrete example?");
        machine.handle_turn("It depends.").await;

        assert_eq!(machine.snapshot().adaptive_state.question_count, 1);
        assert!(mock.recorded_prompts()[2].contains("Do not switch topics yet."));
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_diagnostic() {
        let (mut machine, mock) = machine();
        machine.start().unwrap();
        machine.handle_turn("Alice").await;
        machine.handle_turn("DevOps").await;
        mock.queue_error(LlmError::auth("GEMINI_API_KEY not configured"));

        let reply = machine.handle_turn("1").await;

        assert_eq!(machine.state(), ConversationState::Active);
        assert!(reply
            .message
            .ends_with(&format!("{DIAGNOSTIC_PREFIX}GEMINI_API_KEY not configured")));
    }

    #[tokio::test]
    async fn test_resume_from_snapshot_json() {
        let (mut machine, mock) = machine();
        profile(&mut machine, &mock).await;
        let json = machine.into_snapshot().to_json().unwrap();

        let restored = Snapshot::from_json(&json).unwrap();
        let mut machine = ConversationStateMachine::from_snapshot(restored, ModelClient::new(mock.clone()));
        mock.queue_json(&json!({"suggested_action": "increase_difficulty"}));
        mock.queue_text("Next one");
        machine.handle_turn("answer").await;

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.adaptive_state.question_count, 2);
        // Hard toggles back to Medium
        assert_eq!(snapshot.adaptive_state.difficulty, Difficulty::Medium);
    }

    #[tokio::test]
    async fn test_late_profiling_answer_moves_to_active() {
        let (mut machine, mock) = machine();
        profile(&mut machine, &mock).await;
        let mut snapshot = machine.into_snapshot();
        snapshot.state = ConversationState::Profiling;

        let mut machine = ConversationStateMachine::from_snapshot(snapshot, ModelClient::new(mock.clone()));
        mock.queue_json(&json!({"suggested_action": "maintain_difficulty"}));
        mock.queue_text("Follow-up");
        let reply = machine.handle_turn("late answer").await;

        assert_eq!(machine.state(), ConversationState::Active);
        assert_eq!(reply.message, "Follow-up");
    }
}

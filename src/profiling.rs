//! Intake profiling
//!
//! Asks a fixed sequence of questions, stores each answer verbatim, and
//! classifies the completed profile into a [`PersonaRecord`] exactly once.

pub mod persona;

pub use persona::{assign_persona, Domain, PersonaRecord, Seniority};

use serde::{Deserialize, Serialize};

/// Profile field filled by one profiling question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    CandidateName,
    RoleFocus,
    YearsExperience,
}

impl ProfileField {
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::CandidateName => "candidate_name",
            ProfileField::RoleFocus => "role_focus",
            ProfileField::YearsExperience => "years_experience",
        }
    }
}

/// A profiling question bound to the field its answer fills
#[derive(Debug)]
pub struct ProfilingQuestion {
    pub field: ProfileField,
    pub text: &'static str,
}

pub const PROFILING_QUESTIONS: &[ProfilingQuestion] = &[
    ProfilingQuestion {
        field: ProfileField::CandidateName,
        text: "Before we begin, could you please tell me your full name?",
    },
    ProfilingQuestion {
        field: ProfileField::RoleFocus,
        text: "What specific role or technology stack are you being assessed for today? \
               (e.g., Python Backend, Frontend React, DevOps)",
    },
    ProfilingQuestion {
        field: ProfileField::YearsExperience,
        text: "How many years of professional experience do you have in this field?",
    },
];

/// Raw intake answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<String>,
}

impl Profile {
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::CandidateName => self.candidate_name.as_deref(),
            ProfileField::RoleFocus => self.role_focus.as_deref(),
            ProfileField::YearsExperience => self.years_experience.as_deref(),
        }
    }

    fn set(&mut self, field: ProfileField, answer: String) {
        let slot = match field {
            ProfileField::CandidateName => &mut self.candidate_name,
            ProfileField::RoleFocus => &mut self.role_focus,
            ProfileField::YearsExperience => &mut self.years_experience,
        };
        *slot = Some(answer);
    }

    pub fn candidate_name_or_default(&self) -> &str {
        self.candidate_name.as_deref().unwrap_or("Candidate")
    }

    /// Background line for the report prompt
    pub fn background(&self) -> String {
        format!(
            "{} with {} years",
            self.role_focus.as_deref().unwrap_or("N/A"),
            self.years_experience.as_deref().unwrap_or("N/A")
        )
    }
}

/// Persisted profiling progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilingEngineState {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub profiling_complete: bool,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaRecord>,
}

/// Profiling engine, rebuilt from its state on every turn
#[derive(Debug, Clone, Default)]
pub struct ProfilingEngine {
    state: ProfilingEngineState,
}

impl ProfilingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted state.
    ///
    /// A completed state saved without its persona gets it re-derived; the
    /// classification is pure, so the result is the one originally assigned.
    pub fn from_state(mut state: ProfilingEngineState) -> Self {
        if state.profiling_complete && state.persona.is_none() {
            state.persona = Some(assign_persona(&state.profile));
        }
        Self { state }
    }

    pub fn state(&self) -> &ProfilingEngineState {
        &self.state
    }

    pub fn into_state(self) -> ProfilingEngineState {
        self.state
    }

    pub fn profile(&self) -> &Profile {
        &self.state.profile
    }

    pub fn is_complete(&self) -> bool {
        self.state.profiling_complete
    }

    pub fn persona(&self) -> Option<&PersonaRecord> {
        self.state.persona.as_ref()
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    /// The question at the current step, or `None` once all are answered
    pub fn next_question(&self) -> Option<&'static str> {
        PROFILING_QUESTIONS
            .get(self.state.current_step)
            .map(|q| q.text)
    }

    /// Store `answer` for the current question and advance.
    ///
    /// Returns `false` without touching anything when profiling is already
    /// complete.
    pub fn record_answer(&mut self, answer: &str) -> bool {
        let Some(question) = PROFILING_QUESTIONS.get(self.state.current_step) else {
            return false;
        };

        self.state.profile.set(question.field, answer.to_string());
        self.state.current_step += 1;
        tracing::debug!(field = question.field.key(), step = self.state.current_step, "Profile answer recorded");

        if self.state.current_step >= PROFILING_QUESTIONS.len() {
            self.state.profiling_complete = true;
            self.assign_persona();
        }
        true
    }

    fn assign_persona(&mut self) {
        if self.state.persona.is_some() {
            return;
        }
        let persona = assign_persona(&self.state.profile);
        tracing::info!(
            persona = %persona.persona_name,
            seniority = %persona.seniority,
            domain = %persona.domain,
            start_difficulty = %persona.start_difficulty,
            "Persona assigned"
        );
        self.state.persona = Some(persona);
    }
}

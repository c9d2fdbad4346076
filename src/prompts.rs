//! Prompt templates
//!
//! Plain text with `{{name}}` placeholders, rendered by
//! [`render_template`](crate::llm::render_template).

/// Next interview question. Placeholders: `persona_context`, `persona_name`,
/// `target_users`, `education`, `experience_level`, `domain_exposure`,
/// `expected_skills`, `struggles`, `start_difficulty`, `max_difficulty`,
/// `target_dimension`, `last_answer`, `strengths`, `weaknesses`,
/// `difficulty`, `adaptive_instruction`.
pub const QUESTION_TEMPLATE: &str = r#"{{persona_context}}

You are writing the next question in a persona-based interview.

Interviewer persona: {{persona_name}}
Candidates: {{target_users}}
Typical background: {{education}}, {{experience_level}}, {{domain_exposure}}
Skills this persona expects: {{expected_skills}}
Areas where candidates often struggle: {{struggles}}
Difficulty range: starts at {{start_difficulty}}, up to {{max_difficulty}}

Dimension to assess this turn: {{target_dimension}}

The candidate's previous answer:
"{{last_answer}}"

Signals so far:
- Strengths: {{strengths}}
- Weaknesses: {{weaknesses}}
- Current difficulty: {{difficulty}}

Instruction for this turn:
{{adaptive_instruction}}

Rules:
1. Ask exactly one open-ended question tied to the persona and the candidate's background.
2. No trivia, no multiple choice, no hints or model answers.
3. Short, vague answers: rephrase and ask the candidate to walk through their reasoning.
4. Correct but shallow answers: follow up with "why" or "how" and ask for a concrete example.
5. Strong, structured answers: raise the difficulty with a new constraint or variation.
6. Answers that sound memorised: ask for the idea in the candidate's own words through a real scenario.
7. Keep it under three sentences. The first question of the interview should be one or two short sentences.

The question must assess {{target_dimension}}.

Return only the question text."#;

/// Per-answer analysis. Placeholders: `persona_name`, `difficulty`,
/// `last_question`, `user_response`.
pub const ANALYSIS_TEMPLATE: &str = r#"You assist an interviewer by scoring the candidate's latest answer so the next question can adapt.

Interviewer persona: {{persona_name}}
Dimensions: Logical Thinking, Communication, Adaptability
Current difficulty: {{difficulty}}

Question asked: "{{last_question}}"
Candidate's answer: "{{user_response}}"

Judge relevance (did it answer the question), depth (reasoning and examples, or surface level),
and clarity (structure of the explanation).

Respond with JSON only:
{
  "quality_score": 1-5,
  "observed_strengths": ["short", "points"],
  "observed_weaknesses": ["short", "points"],
  "suggested_action": "increase_difficulty" | "maintain_difficulty" | "decrease_difficulty" | "probe_deeper"
}"#;

/// End-of-interview report. Placeholders: `candidate_name`, `persona_name`,
/// `background`, `full_conversation`.
pub const REPORT_TEMPLATE: &str = r#"You are an assessment evaluator writing a candidate profile report.

Candidate: {{candidate_name}}
Interviewer persona: {{persona_name}}
Background: {{background}}

Dimensions: Logical Thinking, Communication, Adaptability

Transcript:
{{full_conversation}}

For each dimension give a score from 1 to 5 and a one-line justification grounded in the transcript.
Then list dominant strengths, improvement areas, and behavioural traits (for example analytical,
cautious, expressive), and write a short professional summary and an overall recommendation.
Base every judgement on the transcript. Do not mention models, confidence, or probabilities.

Respond with JSON only:
{
  "profile_summary": "",
  "scores": {
    "logical_thinking": {"score": 0, "justification": ""},
    "communication": {"score": 0, "justification": ""},
    "adaptability": {"score": 0, "justification": ""}
  },
  "strengths": [],
  "improvement_areas": [],
  "behavioral_traits": [],
  "overall_recommendation": ""
}"#;

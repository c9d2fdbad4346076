//! Rule-based persona classification
//!
//! Two ordered tables, seniority then domain, each evaluated first-match-wins.
//! The combination is a pure function of the profile answers.

use super::Profile;
use crate::assessment::{Difficulty, Dimension};
use serde::{Deserialize, Serialize};
use std::fmt;

const PHILOSOPHY: &str = "Reasoning over syntax. Ask 'why' more than 'how'.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seniority {
    Junior,
    #[serde(rename = "Mid-Level")]
    MidLevel,
    Senior,
}

impl Seniority {
    pub fn label(self) -> &'static str {
        match self {
            Seniority::Junior => "Junior",
            Seniority::MidLevel => "Mid-Level",
            Seniority::Senior => "Senior",
        }
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "Backend Engineering")]
    Backend,
    #[serde(rename = "Frontend Engineering")]
    Frontend,
    #[serde(rename = "DevOps & Infrastructure")]
    DevOps,
    #[serde(rename = "General Software Engineering")]
    General,
}

impl Domain {
    pub fn label(self) -> &'static str {
        match self {
            Domain::Backend => "Backend Engineering",
            Domain::Frontend => "Frontend Engineering",
            Domain::DevOps => "DevOps & Infrastructure",
            Domain::General => "General Software Engineering",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the seniority table
#[derive(Debug)]
pub struct SeniorityRule {
    pub seniority: Seniority,
    /// Row applies when years strictly exceed this; `None` matches anything
    pub above_years: Option<u64>,
    pub experience_level: &'static str,
    pub tone: &'static str,
    pub start_difficulty: Difficulty,
    pub behavioral_focus: &'static [&'static str],
}

impl SeniorityRule {
    pub fn matches(&self, years: u64) -> bool {
        self.above_years.is_none_or(|threshold| years > threshold)
    }
}

pub const SENIORITY_RULES: &[SeniorityRule] = &[
    SeniorityRule {
        seniority: Seniority::Senior,
        above_years: Some(5),
        experience_level: "Experienced",
        tone: "peer-to-peer, architectural, high-level",
        start_difficulty: Difficulty::Hard,
        behavioral_focus: &["Leadership", "System Design", "Mentorship"],
    },
    SeniorityRule {
        seniority: Seniority::MidLevel,
        above_years: Some(2),
        experience_level: "Mid-Level",
        tone: "practical, hands-on, balanced",
        start_difficulty: Difficulty::Medium,
        behavioral_focus: &["Problem Solving", "Code Quality", "Collaboration"],
    },
    SeniorityRule {
        seniority: Seniority::Junior,
        above_years: None,
        experience_level: "Fresher",
        tone: "mentorship, fundamental, encouraging",
        start_difficulty: Difficulty::Easy,
        behavioral_focus: &["Curiosity", "Logic", "Learning Agility"],
    },
];

/// One row of the domain table
#[derive(Debug)]
pub struct DomainRule {
    pub domain: Domain,
    /// Lowercase substrings; an empty list is the catch-all row
    pub keywords: &'static [&'static str],
    pub expected_skills: &'static [&'static str],
    pub struggles: &'static [&'static str],
    pub education: &'static str,
}

impl DomainRule {
    /// `role` must already be lowercased
    pub fn matches(&self, role: &str) -> bool {
        self.keywords.is_empty() || self.keywords.iter().any(|k| role.contains(k))
    }
}

pub const DOMAIN_RULES: &[DomainRule] = &[
    DomainRule {
        domain: Domain::Backend,
        keywords: &["python", "backend", "django", "flask"],
        expected_skills: &["Data Structures", "Algorithms", "Database Design"],
        struggles: &["System Design", "Scalability", "Microservices"],
        education: "Computer Science or related field",
    },
    DomainRule {
        domain: Domain::Frontend,
        keywords: &["react", "frontend", "javascript", "css"],
        expected_skills: &["UI/UX Principles", "JavaScript/TypeScript", "State Management"],
        struggles: &["Performance Optimization", "Webpack/Build Tools", "Security"],
        education: "Computer Science, Design, or self-taught portfolio",
    },
    DomainRule {
        domain: Domain::DevOps,
        keywords: &["devops", "cloud", "aws"],
        expected_skills: &["CI/CD", "Cloud Services (AWS/Azure)", "Infrastructure as Code"],
        struggles: &["Complex Networking", "Security Compliance", "Cost Optimization"],
        education: "Engineering or IT Certifications",
    },
    DomainRule {
        domain: Domain::General,
        keywords: &[],
        expected_skills: &["Programming Fundamentals", "Problem Solving", "Debugging"],
        struggles: &["Complex Logic", "Design Patterns", "Testing"],
        education: "STEM degree or relevant experience",
    },
];

/// First contiguous run of ASCII digits, saturating on overflow; 0 if none
pub fn parse_years(text: &str) -> u64 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(u64::MAX)
    }
}

pub fn seniority_rule(years: u64) -> &'static SeniorityRule {
    SENIORITY_RULES
        .iter()
        .find(|rule| rule.matches(years))
        .unwrap_or(&SENIORITY_RULES[SENIORITY_RULES.len() - 1])
}

pub fn domain_rule(role_focus: &str) -> &'static DomainRule {
    let role = role_focus.to_lowercase();
    DOMAIN_RULES
        .iter()
        .find(|rule| rule.matches(&role))
        .unwrap_or(&DOMAIN_RULES[DOMAIN_RULES.len() - 1])
}

/// Interviewer character derived from the intake profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub persona_name: String,
    pub seniority: Seniority,
    pub domain: Domain,
    pub tone: String,
    pub target_users: String,
    pub education: String,
    pub experience_level: String,
    pub expected_skills: Vec<String>,
    pub struggles: Vec<String>,
    pub behavioral_focus: Vec<String>,
    pub philosophy: String,
    pub start_difficulty: Difficulty,
    pub max_difficulty: Difficulty,
    pub assessment_dimensions: [Dimension; 3],
}

impl PersonaRecord {
    /// "Senior Backend Engineering Interviewer (peer-to-peer, ...)"
    pub fn summary(&self) -> String {
        format!("{} ({})", self.persona_name, self.tone)
    }

    pub fn domain_exposure(&self) -> &'static str {
        self.domain.label()
    }

    /// One-paragraph interviewer description opening the question prompt
    pub fn context(&self) -> String {
        format!(
            "You are a {}. Your tone is {}. Your philosophy is: {}",
            self.persona_name, self.tone, self.philosophy
        )
    }
}

/// Classify a profile into a persona
pub fn assign_persona(profile: &Profile) -> PersonaRecord {
    let years = parse_years(profile.years_experience.as_deref().unwrap_or_default());
    let level = seniority_rule(years);
    let area = domain_rule(profile.role_focus.as_deref().unwrap_or_default());

    let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();

    PersonaRecord {
        persona_name: format!("{} {} Interviewer", level.seniority, area.domain),
        seniority: level.seniority,
        domain: area.domain,
        tone: level.tone.to_string(),
        target_users: format!("Candidates aiming for {} {} roles", level.seniority, area.domain),
        education: area.education.to_string(),
        experience_level: level.experience_level.to_string(),
        expected_skills: owned(area.expected_skills),
        struggles: owned(area.struggles),
        behavioral_focus: owned(level.behavioral_focus),
        philosophy: PHILOSOPHY.to_string(),
        start_difficulty: level.start_difficulty,
        max_difficulty: Difficulty::Hard,
        assessment_dimensions: Dimension::ALL,
    }
}

//! Prompt-level client over an [`LlmService`]
//!
//! Renders `{{name}}` templates, retries rate-limited calls with backoff, and
//! extracts JSON objects from model output. Neither entry point returns an
//! error: failures come back as a tagged diagnostic string or an empty map.

use super::{LlmError, LlmRequest, LlmService};
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Prefix marking a response that is a backend diagnostic, not model output
pub const DIAGNOSTIC_PREFIX: &str = "DEBUG ERROR: ";

/// Structured model output
pub type JsonMap = Map<String, Value>;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern is valid"));

static RETRY_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:retry|try again) in (\d+(?:\.\d+)?)\s*s").expect("retry pattern is valid")
});

/// Named values substituted into a prompt template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Replace every `{{key}}` with its value in a single pass.
///
/// Unknown placeholders are left as-is, and substituted values are never
/// rescanned, so a value containing `{{x}}` stays literal.
pub fn render_template(template: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            vars.get(&caps[1])
                .map_or_else(|| caps[0].to_string(), str::to_string)
        })
        .into_owned()
}

/// Strip a surrounding markdown code fence (```` ```json ```` or bare ```` ``` ````)
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parse model output into a JSON object, or an empty map
pub fn parse_json_object(text: &str) -> JsonMap {
    let body = strip_code_fence(text);
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(raw = %body, kind = json_kind(&other), "Model output is not a JSON object");
            JsonMap::new()
        }
        Err(e) => {
            tracing::warn!(raw = %body, error = %e, "JSON parse error in model output");
            JsonMap::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Wait hint carried in the error, either structured or in the message text.
///
/// Hints too large for a `Duration` saturate; [`BackoffPolicy::delay`] caps them.
fn retry_hint(err: &LlmError) -> Option<Duration> {
    err.retry_after.or_else(|| {
        let caps = RETRY_HINT.captures(&err.message)?;
        let secs: f64 = caps[1].parse().ok()?;
        Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    })
}

/// Retry schedule for rate-limited backend calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fallback wait grows linearly: `(attempt + 1) * fallback_step`
    pub fallback_step: Duration,
    /// Added on top of a backend-supplied hint
    pub safety_margin: Duration,
    /// Longest backend-supplied hint honoured as-is
    pub max_hint: Duration,
    /// Upper bound of uniform jitter added to fallback waits
    pub jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            fallback_step: Duration::from_secs(5),
            safety_margin: Duration::from_secs(1),
            max_hint: Duration::from_secs(120),
            jitter: Duration::ZERO,
        }
    }
}

impl BackoffPolicy {
    /// Wait before retrying after the zero-based `attempt` failed
    pub fn delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_hint).saturating_add(self.safety_margin);
        }
        let base = self.fallback_step.saturating_mul(attempt.saturating_add(1));
        if self.jitter.is_zero() {
            base
        } else {
            let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
            base.saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms)))
        }
    }
}

/// Clock used for backoff waits
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Template-driven client used by the interview flow
#[derive(Clone)]
pub struct ModelClient {
    service: Arc<dyn LlmService>,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ModelClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self {
            service,
            backoff: BackoffPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn model_id(&self) -> &str {
        self.service.model_id()
    }

    /// Render `template` and return the model's trimmed text.
    ///
    /// Rate limits are retried per the backoff policy. Any other failure, or
    /// running out of attempts, returns a [`DIAGNOSTIC_PREFIX`]-tagged string.
    pub async fn generate_content(&self, template: &str, vars: &TemplateVars) -> String {
        let request = LlmRequest::new(render_template(template, vars));
        let max_attempts = self.backoff.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            match self.service.complete(&request).await {
                Ok(response) => return response.text.trim().to_string(),
                Err(err) if err.is_rate_limited() && attempt + 1 < max_attempts => {
                    let delay = self.backoff.delay(attempt, retry_hint(&err));
                    tracing::warn!(
                        model = %self.service.model_id(),
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = %delay.as_millis(),
                        "Rate limit hit, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        model = %self.service.model_id(),
                        attempts = attempt + 1,
                        error = %err,
                        "Backend call failed"
                    );
                    return format!("{DIAGNOSTIC_PREFIX}{err}");
                }
            }
        }
    }

    /// Like [`generate_content`](Self::generate_content), parsed as a JSON object.
    ///
    /// Unparseable or non-object output (including diagnostics) yields an
    /// empty map.
    pub async fn generate_json(&self, template: &str, vars: &TemplateVars) -> JsonMap {
        let text = self.generate_content(template, vars).await;
        parse_json_object(&text)
    }
}

//! Backend selection from configuration

use super::gemini::{GeminiService, DEFAULT_GEMINI_MODEL};
use super::openai::{OpenAIService, DEFAULT_GROQ_MODEL};
use super::{LlmError, LlmRequest, LlmResponse, LlmService, LoggingService};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

/// Generative backend vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Gemini,
    Groq,
}

impl Backend {
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::Gemini => "Gemini",
            Backend::Groq => "Groq",
        }
    }

    /// Environment variable holding this backend's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Backend::Gemini => "GEMINI_API_KEY",
            Backend::Groq => "GROQ_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Backend::Gemini => DEFAULT_GEMINI_MODEL,
            Backend::Groq => DEFAULT_GROQ_MODEL,
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Backend::Gemini),
            "groq" => Ok(Backend::Groq),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Configuration for the generative backend
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// Explicit backend choice; otherwise the first backend with a key wins
    pub backend: Option<Backend>,
    /// Model override for the selected backend
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let backend = std::env::var("INTERVIEW_BACKEND").ok().and_then(|raw| {
            raw.parse()
                .map_err(|e: String| tracing::warn!(error = %e, "Ignoring INTERVIEW_BACKEND"))
                .ok()
        });

        Self {
            gemini_api_key: non_empty_env(Backend::Gemini.api_key_env_var()),
            groq_api_key: non_empty_env(Backend::Groq.api_key_env_var()),
            backend,
            model: non_empty_env("INTERVIEW_MODEL"),
        }
    }

    fn api_key(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Gemini => self.gemini_api_key.as_deref(),
            Backend::Groq => self.groq_api_key.as_deref(),
        }
        .filter(|k| !k.is_empty())
    }

    /// The backend to use: the explicit choice, or the first one with a key
    pub fn selected_backend(&self) -> Backend {
        self.backend.unwrap_or_else(|| {
            [Backend::Gemini, Backend::Groq]
                .into_iter()
                .find(|b| self.api_key(*b).is_some())
                .unwrap_or(Backend::Gemini)
        })
    }

    /// Build the configured service, wrapped with logging.
    ///
    /// A backend without credentials still yields a service; every call on it
    /// fails with an auth error so callers see a diagnostic instead of a crash.
    pub fn build_service(&self) -> Arc<dyn LlmService> {
        let backend = self.selected_backend();
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| backend.default_model().to_string());

        let inner: Arc<dyn LlmService> = match (backend, self.api_key(backend)) {
            (Backend::Gemini, Some(key)) => Arc::new(GeminiService::new(key.to_string(), &model)),
            (Backend::Groq, Some(key)) => Arc::new(OpenAIService::groq(key.to_string(), &model)),
            (_, None) => {
                tracing::warn!(
                    backend = backend.display_name(),
                    env_var = backend.api_key_env_var(),
                    "No API key configured for backend"
                );
                Arc::new(UnconfiguredService { backend, model })
            }
        };

        Arc::new(LoggingService::new(inner))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Stand-in for a backend whose credentials are missing
pub struct UnconfiguredService {
    backend: Backend,
    model: String,
}

#[async_trait]
impl LlmService for UnconfiguredService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Err(LlmError::auth(format!(
            "{} not configured",
            self.backend.api_key_env_var()
        )))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

//! Text generation provider configuration and selection.

use serde::Serialize;

use crate::types::LlmProvider;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// LLM credentials and preferences, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// `auto` or a provider name.
    pub preferred_provider: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
}

/// Provider chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
}

/// Public view of the configuration (no keys).
#[derive(Debug, Clone, Serialize)]
pub struct LlmStatus {
    pub preferred_provider: String,
    pub active_provider: Option<String>,
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            preferred_provider: lookup("PULSE_LLM_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "auto".into()),
            gemini_api_key: key("GEMINI_API_KEY"),
            openai_api_key: key("OPENAI_API_KEY"),
            anthropic_api_key: key("ANTHROPIC_API_KEY"),
            groq_api_key: key("GROQ_API_KEY"),
            model: key("PULSE_LLM_MODEL"),
        }
    }

    fn key_for(&self, provider: LlmProvider) -> Option<&String> {
        match provider {
            LlmProvider::Gemini => self.gemini_api_key.as_ref(),
            LlmProvider::OpenAI => self.openai_api_key.as_ref(),
            LlmProvider::Anthropic => self.anthropic_api_key.as_ref(),
            LlmProvider::Groq => self.groq_api_key.as_ref(),
        }
    }

    fn model_for(&self, provider: LlmProvider) -> String {
        if let Some(m) = &self.model {
            return m.clone();
        }
        match provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL,
            LlmProvider::OpenAI => DEFAULT_OPENAI_MODEL,
            LlmProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            LlmProvider::Groq => DEFAULT_GROQ_MODEL,
        }
        .into()
    }

    /// Resolve which provider, model and key to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let resolved = |provider: LlmProvider| {
            self.key_for(provider).map(|k| ResolvedProvider {
                provider,
                model: self.model_for(provider),
                api_key: k.clone(),
            })
        };

        // Explicit preference
        if self.preferred_provider != "auto" {
            return match self.preferred_provider.as_str() {
                "gemini" => resolved(LlmProvider::Gemini),
                "openai" => resolved(LlmProvider::OpenAI),
                "anthropic" => resolved(LlmProvider::Anthropic),
                "groq" => resolved(LlmProvider::Groq),
                _ => None,
            };
        }

        // Auto mode: Gemini > Anthropic > Groq > OpenAI
        [
            LlmProvider::Gemini,
            LlmProvider::Anthropic,
            LlmProvider::Groq,
            LlmProvider::OpenAI,
        ]
        .into_iter()
        .find_map(resolved)
    }

    pub fn status(&self) -> LlmStatus {
        let resolved = self.resolve_provider();
        LlmStatus {
            preferred_provider: self.preferred_provider.clone(),
            active_provider: resolved.as_ref().map(|r| r.provider.to_string()),
            model: resolved.map(|r| r.model),
        }
    }
}

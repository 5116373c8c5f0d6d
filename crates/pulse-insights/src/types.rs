//! Insight types matching the frontend's expected JSON.

use serde::{Deserialize, Serialize};

/// Text generation provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    OpenAI,
    Anthropic,
    Groq,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::OpenAI => write!(f, "openai"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
            LlmProvider::Groq => write!(f, "groq"),
        }
    }
}

/// Structured insights returned by the text generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,
    pub categories: Vec<InsightCategory>,
}

/// A group of insight items such as `peak_hours` or `recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCategory {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<InsightItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightItem {
    pub title: String,
    pub description: String,
    /// Metric or time; generators return either strings or numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Estimated benefit, used by recommendations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<serde_json::Value>,
}

/// Body of a successful insights response.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsResponse {
    pub success: bool,
    pub insights: Insights,
}

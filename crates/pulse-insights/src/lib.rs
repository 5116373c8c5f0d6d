//! Carbon Pulse Insights — narrative insights from an external text generator.
//!
//! The forecast store is summarized, rendered into a fixed prompt and sent to
//! whichever provider is configured (Gemini, Anthropic, Groq or OpenAI). The
//! reply must be the nested insights JSON; anything else is rejected as an
//! invalid upstream response.

pub mod config;
pub mod prompt;
pub mod providers;
pub mod service;
pub mod types;

pub use config::LlmConfig;
pub use prompt::{build_prompt, parse_insights};
pub use providers::{LlmClient, TextGenerator};
pub use service::InsightService;
pub use types::*;

//! External text generation providers.
//!
//! Gemini uses `generateContent`. OpenAI and Groq share the chat completions
//! format. Anthropic uses the messages API. All calls are single-shot.

use std::time::Duration;

use futures::future::BoxFuture;
use pulse_core::{Error, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{LlmConfig, ResolvedProvider};
use crate::types::LlmProvider;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

const MAX_TOKENS: usize = 4096;
const TEMPERATURE: f64 = 0.4;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Turns a prompt into generated text.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;

    /// Provider label for logs, or `None` when nothing is configured.
    fn provider(&self) -> Option<String>;
}

/// HTTP client for the configured provider.
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let ResolvedProvider {
            provider,
            model,
            api_key,
        } = self.config.resolve_provider().ok_or_else(|| {
            Error::Upstream("No text generation provider configured".into())
        })?;

        debug!("Generating with {} model {}", provider, model);

        match provider {
            LlmProvider::Gemini => generate_gemini(&self.client, prompt, &model, &api_key).await,
            LlmProvider::OpenAI => {
                generate_openai_compat(&self.client, OPENAI_URL, prompt, &model, &api_key).await
            }
            LlmProvider::Groq => {
                generate_openai_compat(&self.client, GROQ_URL, prompt, &model, &api_key).await
            }
            LlmProvider::Anthropic => {
                generate_anthropic(&self.client, prompt, &model, &api_key).await
            }
        }
    }
}

impl TextGenerator for LlmClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.call(prompt))
    }

    fn provider(&self) -> Option<String> {
        self.config.resolve_provider().map(|r| r.provider.to_string())
    }
}

async fn send_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| Error::Upstream(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Upstream(format!("API error {}: {}", status, body)));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| Error::InvalidUpstreamResponse(format!("Response is not JSON: {}", e)))
}

async fn generate_gemini(client: &Client, prompt: &str, model: &str, api_key: &str) -> Result<String> {
    let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, model);
    let body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "temperature": TEMPERATURE },
    });
    let parsed = send_json(client.post(&url).header("x-goog-api-key", api_key), &body).await?;
    gemini_text(&parsed)
}

async fn generate_openai_compat(
    client: &Client,
    url: &str,
    prompt: &str,
    model: &str,
    api_key: &str,
) -> Result<String> {
    let body = json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    });
    let parsed = send_json(
        client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key)),
        &body,
    )
    .await?;
    openai_text(&parsed)
}

async fn generate_anthropic(
    client: &Client,
    prompt: &str,
    model: &str,
    api_key: &str,
) -> Result<String> {
    let body = json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    });
    let parsed = send_json(
        client
            .post(ANTHROPIC_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01"),
        &body,
    )
    .await?;
    anthropic_text(&parsed)
}

fn non_empty(text: String, provider: &str) -> Result<String> {
    if text.trim().is_empty() {
        Err(Error::InvalidUpstreamResponse(format!(
            "{} response contained no text",
            provider
        )))
    } else {
        Ok(text)
    }
}

/// Concatenate the text parts of the first Gemini candidate.
fn gemini_text(response: &Value) -> Result<String> {
    let text = response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();
    non_empty(text, "gemini")
}

fn openai_text(response: &Value) -> Result<String> {
    let text = response["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    non_empty(text, "chat completions")
}

fn anthropic_text(response: &Value) -> Result<String> {
    let text = response["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();
    non_empty(text, "anthropic")
}

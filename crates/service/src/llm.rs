//! Chat-completions client for OpenAI-compatible endpoints (OpenRouter by default).

use async_trait::async_trait;
use deckgen_core::{Config, Error, Result};
use serde::{Deserialize, Serialize};

/// Longest upstream error body kept in log-facing error messages.
const MAX_ERROR_BODY: usize = 300;

/// A language model that turns a prompt into free text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt. Failures are reported as [`Error::LlmFailed`].
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter chat completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    referer: String,
}

impl OpenRouterClient {
    /// Create a client from configuration.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            url: config.llm_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            referer: config.referer.clone(),
        }
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::LlmFailed("OPENROUTER_API_KEY is not set".to_string()))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        log::debug!("Requesting completion from {} ({})", self.url, self.model);
        let res = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::LlmFailed(format!("request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(Error::LlmFailed(format!("{} - {}", status, snippet)));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| Error::LlmFailed(format!("response parse failed: {}", e)))?;

        let content = extract_content(parsed)?;
        log::info!("Received {}-byte completion", content.len());
        Ok(content)
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| Error::LlmFailed("response contained no choices".to_string()))
}

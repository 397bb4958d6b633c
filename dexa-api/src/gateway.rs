//! OpenAI-compatible chat completion client.

use async_trait::async_trait;
use dexa_core::completion::{ChatTurn, Completion, CompletionRequest, TokenUsage};
use dexa_core::domain::LlmConfig;
use dexa_core::{CompletionProvider, CoreError, Result};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sends completion requests to `{api_base}/chat/completions`.
#[derive(Clone)]
pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    config: LlmConfig,
}

impl OpenAiGateway {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if !config.api_key.is_empty() {
            let mut bearer = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| CoreError::Validation(format!("Invalid API key: {}", e)))?;
            bearer.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!("{}/chat/completions", config.api_base.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionProvider for OpenAiGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = ChatCompletionBody {
            model,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
        };

        debug!(model, turns = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Upstream(format!("LLM API request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::Upstream(format!("Failed to read LLM API response: {}", e)))?;

        if !status.is_success() {
            return Err(CoreError::Upstream(format!(
                "LLM API error ({}): {}",
                status.as_u16(),
                text
            )));
        }

        let reply: ChatCompletionReply = serde_json::from_str(&text)
            .map_err(|e| CoreError::Upstream(format!("Malformed LLM API response: {}", e)))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(Completion {
            text: content,
            model: reply.model.unwrap_or_else(|| model.to_string()),
            usage: reply.usage,
        })
    }
}

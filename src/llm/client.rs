use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::APP_TITLE;

pub const UPSTREAM_ERROR_FALLBACK: &str = "Failed to fetch suggestion";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to reach LLM API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse LLM API response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    referer: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

// OpenAI-compatible chat completions format (used by OpenRouter)
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

// `choices` and `message` are required: a body without them is a schema
// violation, not an empty suggestion.
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
struct UpstreamErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// First choice's content, `None` when there was no choice or it was empty.
    pub text: Option<String>,
    pub model: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmClient {
    pub fn new(
        api_key: &str,
        base_url: &str,
        referer: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            referer: referer.to_string(),
        })
    }

    pub async fn complete(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        user_message: &str,
        sampling: Sampling,
    ) -> Result<LlmResponse, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user_message.to_string(),
        });

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("content-type", "application/json")
            .header("Referer", &self.referer)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "OpenRouter error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: upstream_error_message(&body),
            });
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}

/// Pulls `error.message` out of an upstream failure body.
pub fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| UPSTREAM_ERROR_FALLBACK.to_string())
}

fn parse_completion(body: &str) -> Result<LlmResponse, LlmError> {
    let api_response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Decode(e.to_string()))?;

    let text = api_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.is_empty());

    let (input_tokens, output_tokens) = api_response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(LlmResponse {
        text,
        model: api_response.model,
        input_tokens,
        output_tokens,
    })
}

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::wire::{ErrorEnvelope, SuggestRequest, SuggestionEnvelope};

#[derive(Debug, Error)]
pub enum SuggestionFailure {
    #[error("Suggestion proxy rejected the request ({status}): {error}")]
    Rejected {
        status: u16,
        error: String,
        user_message: String,
    },

    #[error("Unexpected suggestion proxy response ({status})")]
    Unexpected { status: u16 },

    #[error("Failed to reach suggestion proxy: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SuggestionFailure {
    /// The proxy's display-safe message, when it sent one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            SuggestionFailure::Rejected { user_message, .. } if !user_message.is_empty() => {
                Some(user_message.as_str())
            }
            _ => None,
        }
    }
}

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, task: &str) -> Result<SuggestionEnvelope, SuggestionFailure>;
}

/// Talks to the suggestion proxy's `POST /api/ai`.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    url: String,
}

impl ProxyClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SuggestionFailure> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SuggestionSource for ProxyClient {
    async fn suggest(&self, task: &str) -> Result<SuggestionEnvelope, SuggestionFailure> {
        let response = self
            .client
            .post(&self.url)
            .json(&SuggestRequest {
                task: Some(task.to_string()),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(SuggestionFailure::Rejected {
                status: status.as_u16(),
                error: envelope.error,
                user_message: envelope.user_message,
            }),
            Err(_) => {
                tracing::debug!(status = status.as_u16(), body = %body, "Proxy failure without envelope");
                Err(SuggestionFailure::Unexpected {
                    status: status.as_u16(),
                })
            }
        }
    }
}

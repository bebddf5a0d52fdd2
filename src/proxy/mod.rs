pub mod error;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::llm::{LlmClient, LlmError, Sampling};
use crate::wire::{SuggestRequest, SuggestionEnvelope, SuggestionMetadata, SUGGESTION_FORMAT};

pub use error::ProxyError;

pub const NO_SUGGESTION: &str = "No suggestion available.";

const SYSTEM_PROMPT: &str = r#"You are a smart task planning assistant. Return concise and actionable suggestions for completing tasks in bullet-point format like this:

• Estimated time to complete
• Task difficulty level
• Materials needed (if any)
• Key steps to follow (up to 5 steps)
• Tips and best practices

Avoid markdown headers like # or ##. Output should be clean bullet points with short phrases."#;

const SAMPLING: Sampling = Sampling {
    max_tokens: 350,
    temperature: 0.7,
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    /// `None` when no credential is configured.
    llm: Option<LlmClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, LlmError> {
        let llm = match config.openrouter_api_key.as_deref() {
            Some(key) => Some(LlmClient::new(
                key,
                &config.upstream_url,
                &config.referer,
                config.upstream_timeout,
            )?),
            None => {
                tracing::warn!("OPENROUTER_API_KEY is not set; suggestions will fail until it is");
                None
            }
        };
        Ok(Self {
            config: Arc::new(config),
            llm,
        })
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai", post(suggest))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let app = app_router(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Suggestion proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;
    tracing::info!("Suggestion proxy stopped");
    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "configured": state.llm.is_some(),
    }))
}

async fn suggest(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestionEnvelope>, ProxyError> {
    let task = match payload {
        Ok(Json(request)) => request.task.filter(|t| !t.trim().is_empty()),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected suggestion request body");
            None
        }
    }
    .ok_or(ProxyError::InvalidRequest)?;

    let llm = state.llm.as_ref().ok_or_else(|| {
        tracing::error!("OpenRouter API key not configured");
        ProxyError::Configuration
    })?;

    let started = Instant::now();
    let user_message = format!("Please help me plan this task: {}", task);
    let response = llm
        .complete(&state.config.model, Some(SYSTEM_PROMPT), &user_message, SAMPLING)
        .await
        .map_err(|err| match err {
            LlmError::Status { status, message } => ProxyError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            },
            other => {
                tracing::error!(error = %other, "Unexpected error while fetching suggestion");
                ProxyError::Internal(other.to_string())
            }
        })?;

    tracing::info!(
        latency_ms = started.elapsed().as_millis() as u64,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "Suggestion generated"
    );

    Ok(Json(SuggestionEnvelope {
        suggestion: response.text.unwrap_or_else(|| NO_SUGGESTION.to_string()),
        metadata: SuggestionMetadata {
            model: response.model.unwrap_or_else(|| state.config.model.clone()),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            format: SUGGESTION_FORMAT.to_string(),
        },
    }))
}

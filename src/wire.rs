//! JSON shapes exchanged between the planner client and the suggestion proxy.

use serde::{Deserialize, Serialize};

pub const SUGGESTION_FORMAT: &str = "bullet-points";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestRequest {
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionEnvelope {
    pub suggestion: String,
    pub metadata: SuggestionMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionMetadata {
    pub model: String,
    pub timestamp: String,
    pub format: String,
}

/// Failure body. `error` is internal detail; only `user_message` is meant for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(rename = "userMessage")]
    pub user_message: String,
}

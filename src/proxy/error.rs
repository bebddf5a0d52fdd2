use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::wire::ErrorEnvelope;

pub const INVALID_REQUEST_MESSAGE: &str = "Please enter a task to get suggestions.";
pub const CONFIGURATION_MESSAGE: &str =
    "Service is temporarily unavailable. Please try again later.";
pub const UPSTREAM_MESSAGE: &str =
    "Unable to generate suggestion at this time. Please try again later.";
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("No task provided")]
    InvalidRequest,

    #[error("Configuration error")]
    Configuration,

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest => StatusCode::BAD_REQUEST,
            ProxyError::Configuration | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Upstream { status, .. } => *status,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequest => INVALID_REQUEST_MESSAGE,
            ProxyError::Configuration => CONFIGURATION_MESSAGE,
            ProxyError::Upstream { .. } => UPSTREAM_MESSAGE,
            ProxyError::Internal(_) => INTERNAL_MESSAGE,
        }
    }

    /// Value of the envelope's `error` field. Internal failures never carry their detail.
    fn public_detail(&self) -> String {
        match self {
            ProxyError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            error: self.public_detail(),
            user_message: self.user_message().to_string(),
        };
        (self.status(), Json(envelope)).into_response()
    }
}

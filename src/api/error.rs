use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::ChatError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// An error rendered as `{ "error": kind, "message": text }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_persona(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "unknown_persona",
            format!("No persona named '{id}'."),
        )
    }

    pub fn unavailable(kind: &'static str, reason: &str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            kind,
            format!("The AI service isn't available: {reason}"),
        )
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::EmptyInput => StatusCode::BAD_REQUEST,
            ChatError::MissingApiKey
            | ChatError::InvalidApiKey
            | ChatError::EnvironmentVariableNotSet { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::EmptyResponse | ChatError::NoResponseContent | ChatError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = self.kind, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            error: self.kind,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failure of a single upstream call.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API error: HTTP {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("Invalid coordinates")]
    InvalidCoordinates,
}

/// Error returned by the HTTP handlers.
///
/// Cloneable so that a failure shared between coalesced cache lookups can be
/// handed to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("City parameter is required")]
    Validation { example: String },
    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String, example: String },
    #[error("{error}: {message}")]
    NotFound { error: String, message: String },
    #[error("{context}: {message}")]
    Upstream { context: String, message: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(kind: &str) -> Self {
        ApiError::Validation {
            example: format!("/api/{}?city=London&country=GB", kind),
        }
    }

    pub fn invalid_query(kind: &str, message: impl Into<String>) -> Self {
        ApiError::InvalidQuery {
            message: message.into(),
            example: format!("/api/{}?city=London&country=GB", kind),
        }
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Hides upstream detail when running in production.
    pub fn redacted(self, production: bool) -> Self {
        if !production {
            return self;
        }
        match self {
            ApiError::Upstream { context, .. } => ApiError::Upstream {
                context,
                message: "Something went wrong".to_string(),
            },
            ApiError::Internal(_) => ApiError::Internal("Something went wrong".to_string()),
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { example } => json!({
                "error": "City parameter is required",
                "message": "The 'city' query parameter must not be empty",
                "example": example,
            }),
            ApiError::InvalidQuery { message, example } => json!({
                "error": "Invalid query string",
                "message": message,
                "example": example,
            }),
            ApiError::NotFound { error, message } => json!({
                "error": error,
                "message": message,
            }),
            ApiError::Upstream { context, message } => json!({
                "error": context,
                "message": message,
            }),
            ApiError::Internal(message) => json!({
                "error": "Internal server error",
                "message": message,
            }),
        };
        (status, Json(body)).into_response()
    }
}

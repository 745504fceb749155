use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use mediascout_core::ScoutError;

use super::minidlna::MinidlnaError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<ScoutError> for AppError {
    fn from(err: ScoutError) -> Self {
        let message = err.to_string();
        match err {
            ScoutError::NotFound(_) | ScoutError::MetadataNotFound(_) => {
                Self::not_found(message)
            }
            ScoutError::NotADirectory(_) => Self::bad_request(message),
            ScoutError::PermissionDenied(_) => Self::forbidden(message),
            ScoutError::InvalidApiKey
            | ScoutError::Api(_)
            | ScoutError::Parse(_)
            | ScoutError::Fetch(_) => Self::bad_gateway(message),
            ScoutError::RateLimited { .. }
            | ScoutError::ServiceUnavailable(_) => {
                Self::service_unavailable(message)
            }
            ScoutError::InvalidImage(_) => Self::bad_gateway(message),
            ScoutError::Io { .. }
            | ScoutError::Write { .. }
            | ScoutError::Internal(_) => {
                tracing::error!("request failed: {}", message);
                Self::internal(message)
            }
        }
    }
}

impl From<MinidlnaError> for AppError {
    fn from(err: MinidlnaError) -> Self {
        match err {
            MinidlnaError::NotConfigured => Self::not_found(err.to_string()),
            MinidlnaError::Webhook(_) => Self::bad_gateway(err.to_string()),
            MinidlnaError::Client(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

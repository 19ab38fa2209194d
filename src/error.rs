//! Request-boundary error type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::types::ErrorResponse;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input rejected before touching the store
    #[error("{0}")]
    InvalidRequest(String),

    /// No database connection string was configured
    #[error("db not configured")]
    NotConfigured,

    /// Failure reported by the persistence layer
    #[error("{0:#}")]
    Database(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.code(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

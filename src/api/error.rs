//! API error responses.
//!
//! Every failure is rendered as
//! `{"errors": [{"code": "<Code>", "message": "<text>"}]}`.

use crate::api::model::{ApiErrors, ApiMessage};
use crate::storage::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotAllowed(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn undecodable_body() -> Self {
        ApiError::bad_request("Cannot decode request body")
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "NotAllowed"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::NotFound(format!("Key {} not found", key)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ApiErrors {
            errors: vec![ApiMessage::error(code, self.to_string())],
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

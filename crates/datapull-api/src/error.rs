use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use datapull_core::Error as CoreError;
use serde::Serialize;
use thiserror::Error;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    /// Logged, never shown to clients.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Internal(message) => {
                tracing::error!("Unexpected error: {}", message);
                UNEXPECTED_ERROR.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidQuery(_) => ApiError::Unprocessable(err.to_string()),
            CoreError::InvalidFields { .. } | CoreError::ScraperRequired(_) => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<datapull_store::Error> for ApiError {
    fn from(err: datapull_store::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

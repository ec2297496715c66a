use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::ride::RideStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation not permitted while ride is {current:?}")]
    InvalidState { current: RideStatus },

    #[error("ride already taken by another driver")]
    AlreadyTaken,

    #[error("otp does not match")]
    OtpMismatch,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidState { .. } => "invalid_state",
            AppError::AlreadyTaken => "already_taken",
            AppError::OtpMismatch => "otp_mismatch",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState { .. } => StatusCode::CONFLICT,
            AppError::AlreadyTaken => StatusCode::CONFLICT,
            AppError::OtpMismatch => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        if let AppError::InvalidState { current } = &self {
            body["current_status"] = json!(current);
        }

        (status, Json(body)).into_response()
    }
}

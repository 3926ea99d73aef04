//! HTTP mapping for the `mb-core` error taxonomy.
//!
//! Every failure becomes a structured JSON body with a human-readable
//! message; validation failures carry one message per invalid field.
//! Internal details are logged, never exposed.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use mb_core::error::AppError;
use serde_json::json;
use std::fmt;

/// Newtype so `ResponseError` can be implemented for the core taxonomy.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_)
            | AppError::InvalidAttachment(_)
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match &self.0 {
            AppError::Validation(errors) => json!({ "message": errors }),
            AppError::InvalidAttachment(message) | AppError::Conflict(message) => {
                json!({ "message": message })
            }
            AppError::Unauthenticated(message) => json!({ "message": message }),
            AppError::InvalidCredentials => json!({ "message": "Invalid credentials" }),
            AppError::NotFound(entity) => json!({ "message": format!("{entity} not found") }),
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                json!({ "message": "Server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

//! modboard/crates/mb-api/src/middleware.rs
//!
//! The bearer-token auth gate and shared HTTP middleware.

use crate::error::ApiError;
use crate::handlers::AppState;
use actix_cors::Cors;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, FromRequest, HttpRequest};
use mb_core::error::AppError;
use std::future::{ready, Ready};
use uuid::Uuid;

/// Proof that the request carried a valid admin bearer token.
///
/// Every privileged route takes this extractor, so the gate logic exists
/// exactly once: missing header fails without decoding, bad or expired
/// tokens fail inside `AuthProvider::verify_token`, and the embedded
/// identity rides along for the handler. The gate runs before any lookup
/// or mutation.
#[derive(Debug, Clone, Copy)]
pub struct AdminClaims {
    pub admin_id: Uuid,
}

impl FromRequest for AdminClaims {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

fn authorize(req: &HttpRequest) -> Result<AdminClaims, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("AppState not configured".to_string()))?;

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("No token provided".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthenticated("No token provided".to_string()))?;

    let admin_id = state.auth.verify_token(token)?;
    Ok(AdminClaims { admin_id })
}

/// Returns the standard request logger for the Modboard API.
pub fn standard_middleware() -> Logger {
    Logger::default()
}

/// Configures CORS (Cross-Origin Resource Sharing).
/// Important if the UI and API ever live on different subdomains.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .max_age(3600)
}

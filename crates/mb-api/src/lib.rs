//! # mb-api
//!
//! The web routing and orchestration layer for Modboard.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod projections;

use actix_web::web;
use error::ApiError;
use mb_core::error::AppError;

/// Configures the routes for the moderation backend.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
/// `/submissions/pending` is registered before `/submissions/{id}` so the
/// literal segment wins the match.
///
/// The extractor configs below keep path and JSON parse failures inside the
/// same `{"message": ...}` envelope the handlers use, instead of actix's
/// plain-text defaults.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .app_data(web::PathConfig::default().error_handler(|_err, _req| {
                // An id segment that is not a UUID names no record.
                ApiError(AppError::NotFound("Submission".to_string())).into()
            }))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError(AppError::Validation(vec![format!(
                    "Invalid JSON payload: {err}"
                )]))
                .into()
            }))
            .route("/submissions", web::post().to(handlers::create_submission))
            .route("/submissions", web::get().to(handlers::list_public))
            .route(
                "/submissions/pending",
                web::get().to(handlers::list_pending),
            )
            .route("/submissions/{id}", web::get().to(handlers::get_submission))
            .route(
                "/submissions/{id}/attachment",
                web::get().to(handlers::get_attachment),
            )
            .route(
                "/submissions/{id}/approve",
                web::patch().to(handlers::approve),
            )
            .route(
                "/submissions/{id}/reject",
                web::patch().to(handlers::reject),
            )
            .route("/submissions/{id}", web::delete().to(handlers::remove))
            .route("/admin/register", web::post().to(handlers::register))
            .route("/admin/login", web::post().to(handlers::login)),
    );
}

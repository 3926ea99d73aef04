//! # mb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and core ports:
//! parse and validate, persist, then fire the notification side-effect
//! without ever letting delivery failures reach the response.

use crate::error::ApiError;
use crate::middleware::AdminClaims;
use crate::projections::{FullSubmission, PublicSubmission};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use mb_core::error::AppError;
use mb_core::models::{Admin, ModerationStatus, Submission, SubmissionBody, Upload};
use mb_core::traits::{AdminRepo, AttachmentStore, AuthProvider, Notifier, SubmissionRepo};
use mb_core::validate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// State shared across all actix-web workers, assembled once by the binary.
pub struct AppState {
    pub repo: Arc<dyn SubmissionRepo>,
    pub admins: Arc<dyn AdminRepo>,
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn AttachmentStore>,
    pub notifier: Arc<dyn Notifier>,
}

// ── Submissions ─────────────────────────────────────────────────────────────

/// Orchestrates the creation of a new submission.
///
/// Field validation and attachment validation both complete before any
/// store or repository call, so a rejected request leaves no partial state.
/// The notification is spawned only after the record is persisted.
pub async fn create_submission(
    data: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = read_form(payload).await?;

    let mut name = form.name.take().unwrap_or_default();
    let mut email = form.email.take().unwrap_or_default();
    let mut body = form.take_body()?;
    validate::submission(&mut name, &mut email, &mut body)?;

    // Only blog posts carry an image; a booking with a file part is refused
    // before anything is stored.
    let attachment = match form.upload.take() {
        Some(_) if matches!(body, SubmissionBody::Booking { .. }) => {
            return Err(AppError::InvalidAttachment(
                "Image uploads are only accepted on blog posts".to_string(),
            )
            .into());
        }
        Some(upload) => Some(data.store.ingest(upload).await?),
        None => None,
    };

    let submission = Submission::new(name, email, body, attachment);
    data.repo.create(&submission).await?;

    let message = match &submission.body {
        SubmissionBody::Booking { .. } => "Booking request submitted successfully",
        SubmissionBody::Post { .. } => "Blog post created successfully",
    };

    let response = HttpResponse::Created().json(json!({
        "message": message,
        "submission": PublicSubmission::from(&submission),
    }));

    let notifier = data.notifier.clone();
    actix_web::rt::spawn(async move {
        if let Err(err) = notifier.submission_received(&submission).await {
            log::warn!("new-submission notification failed: {err:#}");
        }
    });

    Ok(response)
}

/// Approved submissions, newest first, public projection.
pub async fn list_public(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let submissions = data.repo.list_by_status(ModerationStatus::Approved).await?;
    let view: Vec<PublicSubmission> = submissions.iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(view))
}

/// Pending submissions for the moderation queue (admin only).
pub async fn list_pending(
    data: web::Data<AppState>,
    _claims: AdminClaims,
) -> Result<HttpResponse, ApiError> {
    let submissions = data.repo.list_by_status(ModerationStatus::Pending).await?;
    let view: Vec<FullSubmission> = submissions.iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(view))
}

/// Detail view: everything but the raw bytes. Only the listing hides the
/// contact email.
pub async fn get_submission(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let submission = data
        .repo
        .get(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Submission".to_string()))?;
    Ok(HttpResponse::Ok().json(FullSubmission::from(&submission)))
}

/// Streams the raw attachment bytes with their stored Content-Type.
pub async fn get_attachment(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let submission = data
        .repo
        .get(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Submission".to_string()))?;
    let attachment = submission
        .attachment
        .ok_or_else(|| AppError::NotFound("Image".to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type(attachment.content_type)
        .body(attachment.payload))
}

pub async fn approve(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    _claims: AdminClaims,
) -> Result<HttpResponse, ApiError> {
    let updated = decide(&data, path.into_inner(), ModerationStatus::Approved).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Submission approved successfully",
        "submission": FullSubmission::from(&updated),
    })))
}

pub async fn reject(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    _claims: AdminClaims,
) -> Result<HttpResponse, ApiError> {
    let updated = decide(&data, path.into_inner(), ModerationStatus::Rejected).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Submission rejected successfully",
        "submission": FullSubmission::from(&updated),
    })))
}

pub async fn remove(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    _claims: AdminClaims,
) -> Result<HttpResponse, ApiError> {
    // Disk-mode attachment files are deliberately left behind.
    let deleted = data.repo.delete(path.into_inner()).await?;
    if !deleted {
        return Err(AppError::NotFound("Submission".to_string()).into());
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Submission deleted successfully" })))
}

/// Applies a moderation decision: persist first, then dispatch.
///
/// The overwrite is unconditional — re-deciding an already-decided
/// submission is allowed and the last write wins.
async fn decide(
    data: &AppState,
    id: Uuid,
    status: ModerationStatus,
) -> Result<Submission, AppError> {
    let updated = data
        .repo
        .set_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission".to_string()))?;

    let notifier = data.notifier.clone();
    let snapshot = updated.clone();
    actix_web::rt::spawn(async move {
        if let Err(err) = notifier.decision(&snapshot).await {
            log::warn!("decision notification failed: {err:#}");
        }
    });

    Ok(updated)
}

// ── Admin credentials ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let RegisterRequest {
        username,
        email,
        password,
    } = body.into_inner();
    let username = username.trim().to_string();
    let email = email.trim().to_lowercase();

    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push("Username is required".to_string());
    }
    if email.is_empty() {
        errors.push("Email is required".to_string());
    }
    if password.is_empty() {
        errors.push("Password is required".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors).into());
    }

    let password_hash = data.auth.hash_password(&password)?;
    let admin = Admin {
        id: Uuid::now_v7(),
        username,
        email,
        password_hash,
    };
    // Uniqueness of username and email is enforced by the repository, which
    // surfaces duplicates as Conflict.
    data.admins.create(&admin).await?;

    Ok(HttpResponse::Created().json(json!({ "message": "Admin registered successfully!" })))
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password } = body.into_inner();

    let admin = data
        .admins
        .find_by_username(username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !data.auth.verify_password(&password, &admin.password_hash) {
        return Err(AppError::InvalidCredentials.into());
    }

    let token = data.auth.issue_token(admin.id)?;
    Ok(HttpResponse::Ok().json(json!({ "token": token })))
}

// ── Multipart parsing ───────────────────────────────────────────────────────

#[derive(Default)]
struct RawForm {
    kind: Option<String>,
    name: Option<String>,
    email: Option<String>,
    lab: Option<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    title: Option<String>,
    content: Option<String>,
    faculty: Vec<String>,
    equipment: Vec<String>,
    upload: Option<Upload>,
}

impl RawForm {
    /// Assembles the variant body. Missing text fields become empty strings
    /// so `validate::submission` reports every one of them at once.
    fn take_body(&mut self) -> Result<SubmissionBody, AppError> {
        match self.kind.as_deref().map(str::trim) {
            Some("booking") => Ok(SubmissionBody::Booking {
                lab: self.lab.take().unwrap_or_default(),
                date: self.date.take().unwrap_or_default(),
                start_time: self.start_time.take().unwrap_or_default(),
                end_time: self.end_time.take().unwrap_or_default(),
                faculty: std::mem::take(&mut self.faculty),
                equipment: std::mem::take(&mut self.equipment),
            }),
            Some("post") => Ok(SubmissionBody::Post {
                title: self.title.take().unwrap_or_default(),
                content: self.content.take().unwrap_or_default(),
            }),
            _ => Err(AppError::Validation(vec![
                "Submission kind must be 'booking' or 'post'".to_string(),
            ])),
        }
    }
}

async fn read_form(mut payload: Multipart) -> Result<RawForm, AppError> {
    let mut form = RawForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(multipart_err)? {
        let field_name = field.name().to_string();
        if field_name == "image" {
            if let Some(upload) = read_upload(&mut field).await? {
                form.upload = Some(upload);
            }
            continue;
        }

        let value = read_text(&mut field).await?;
        match field_name.as_str() {
            "kind" => form.kind = Some(value),
            // Posts call this field "author"; same owner-contact slot.
            "name" | "author" => form.name = Some(value),
            "email" => form.email = Some(value),
            "lab" => form.lab = Some(value),
            "date" => form.date = Some(value),
            "start_time" | "startTime" => form.start_time = Some(value),
            "end_time" | "endTime" => form.end_time = Some(value),
            "title" => form.title = Some(value),
            "content" => form.content = Some(value),
            "faculty" | "selectedFaculty" => form.faculty.push(value),
            "equipment" => form.equipment.push(value),
            _ => {} // unknown fields are ignored
        }
    }

    Ok(form)
}

/// Reads the `image` field. Returns `None` for an empty file part (a form
/// submitted with no file selected). Validates type then size before the
/// caller touches any store, and stops buffering once the size bound is
/// blown rather than reading the rest of an oversized body.
async fn read_upload(field: &mut Field) -> Result<Option<Upload>, AppError> {
    let original_name = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_string();
    let content_type = field
        .content_type()
        .map(|mime| mime.to_string())
        .unwrap_or_default();

    if original_name.is_empty() {
        // Drain so the next field can be read.
        while field.try_next().await.map_err(multipart_err)?.is_some() {}
        return Ok(None);
    }

    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_err)? {
        data.extend_from_slice(&chunk);
        if data.len() > validate::MAX_ATTACHMENT_BYTES {
            break;
        }
    }

    let upload = Upload {
        data,
        content_type,
        original_name,
    };
    validate::upload(&upload)?;
    Ok(Some(upload))
}

async fn read_text(field: &mut Field) -> Result<String, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_err)? {
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::Validation(vec!["Form fields must be valid UTF-8".to_string()]))
}

fn multipart_err(err: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(vec![format!("Malformed multipart payload: {err}")])
}

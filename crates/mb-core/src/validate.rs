//! # Submission Validation
//!
//! Field-level validation shared by every transport. Collects one message
//! per invalid field so the API can surface them all at once, mirroring the
//! per-field messages of the persistence schema this replaced.

use crate::error::{AppError, Result};
use crate::models::{SubmissionBody, Upload};
use once_cell::sync::Lazy;
use regex::Regex;

/// MIME types an attachment may carry.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// Attachment payload hard limit.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Post titles are capped at 100 characters.
pub const MAX_TITLE_CHARS: usize = 100;

// Basic shape check only; deliverability is not our problem.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex"));

/// Trims every text field in place, lowercases the email, and validates
/// required-ness and bounds. On failure returns `Validation` carrying one
/// message per offending field.
pub fn submission(name: &mut String, email: &mut String, body: &mut SubmissionBody) -> Result<()> {
    let mut errors = Vec::new();

    trim_in_place(name);
    trim_in_place(email);
    *email = email.to_lowercase();

    if name.is_empty() {
        errors.push("Name is required".to_string());
    }
    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !EMAIL_SHAPE.is_match(email) {
        errors.push("Please enter a valid email".to_string());
    }

    match body {
        SubmissionBody::Booking {
            lab,
            date,
            start_time,
            end_time,
            faculty,
            equipment,
        } => {
            require(lab, "Lab is required", &mut errors);
            require(date, "Date is required", &mut errors);
            require(start_time, "Start time is required", &mut errors);
            require(end_time, "End time is required", &mut errors);
            trim_list(faculty);
            trim_list(equipment);
            if faculty.is_empty() {
                errors.push("At least one faculty member is required".to_string());
            }
            if equipment.is_empty() {
                errors.push("At least one equipment item is required".to_string());
            }
        }
        SubmissionBody::Post { title, content } => {
            require(title, "Title is required", &mut errors);
            if title.chars().count() > MAX_TITLE_CHARS {
                errors.push("Title cannot exceed 100 characters".to_string());
            }
            require(content, "Content is required", &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Checks the declared MIME type against the allow-list, then the size
/// bound. Runs before any store or repository call so a rejected upload
/// leaves no partial state behind.
pub fn upload(upload: &Upload) -> Result<()> {
    if !ALLOWED_IMAGE_TYPES.contains(&upload.content_type.as_str()) {
        return Err(AppError::InvalidAttachment(
            "Invalid file type. Only JPEG, PNG and GIF images are allowed.".to_string(),
        ));
    }
    if upload.data.len() > MAX_ATTACHMENT_BYTES {
        return Err(AppError::InvalidAttachment(
            "Image exceeds the 5 MiB size limit.".to_string(),
        ));
    }
    Ok(())
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

fn require(field: &mut String, message: &str, errors: &mut Vec<String>) {
    trim_in_place(field);
    if field.is_empty() {
        errors.push(message.to_string());
    }
}

fn trim_list(items: &mut Vec<String>) {
    for item in items.iter_mut() {
        trim_in_place(item);
    }
    items.retain(|item| !item.is_empty());
}

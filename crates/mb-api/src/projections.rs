//! Response projections.
//!
//! The public listing never leaks the submitter's email; no view carries
//! raw attachment bytes (the `Attachment` model skips them on serialize, and
//! the dedicated attachment route serves them with the right Content-Type).

use chrono::{DateTime, Utc};
use mb_core::models::{Attachment, ModerationStatus, Submission, SubmissionBody};
use serde::Serialize;
use uuid::Uuid;

/// What the approved-content listing shows anonymous readers.
#[derive(Serialize)]
pub struct PublicSubmission<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub status: ModerationStatus,
    #[serde(flatten)]
    pub body: &'a SubmissionBody,
    pub attachment: Option<&'a Attachment>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Submission> for PublicSubmission<'a> {
    fn from(s: &'a Submission) -> Self {
        Self {
            id: s.id,
            name: &s.name,
            status: s.status,
            body: &s.body,
            attachment: s.attachment.as_ref(),
            created_at: s.created_at,
        }
    }
}

/// Everything except the raw bytes: the detail view and every admin-facing
/// response.
#[derive(Serialize)]
pub struct FullSubmission<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub status: ModerationStatus,
    #[serde(flatten)]
    pub body: &'a SubmissionBody,
    pub attachment: Option<&'a Attachment>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Submission> for FullSubmission<'a> {
    fn from(s: &'a Submission) -> Self {
        Self {
            id: s.id,
            name: &s.name,
            email: &s.email,
            status: s.status,
            body: &s.body,
            attachment: s.attachment.as_ref(),
            created_at: s.created_at,
        }
    }
}

//! # Domain Models
//!
//! These structs represent the core entities of Modboard.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Lifecycle state of a submission. Every submission starts out `Pending`
/// and is moved to `Approved` or `Rejected` by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ModerationStatus::Pending),
            "approved" => Some(ModerationStatus::Approved),
            "rejected" => Some(ModerationStatus::Rejected),
            _ => None,
        }
    }
}

/// Variant-specific content of a submission. Both variants share the same
/// moderation lifecycle; only their payload differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubmissionBody {
    /// A lab booking request.
    Booking {
        lab: String,
        date: String,
        start_time: String,
        end_time: String,
        faculty: Vec<String>,
        equipment: Vec<String>,
    },
    /// A blog post, optionally carrying an image attachment.
    Post { title: String, content: String },
}

impl SubmissionBody {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionBody::Booking { .. } => "booking",
            SubmissionBody::Post { .. } => "post",
        }
    }
}

/// An image owned exclusively by its submission.
///
/// `payload` is populated in both storage modes; `locator` only when the
/// disk-backed store wrote a file. The raw bytes are never serialized into
/// JSON projections — they are served by the dedicated attachment route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub locator: Option<PathBuf>,
    #[serde(skip_serializing, default)]
    pub payload: Vec<u8>,
    pub content_type: String,
}

/// A moderated user submission (booking or post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    /// Owner name (booking requester or post author).
    pub name: String,
    pub email: String,
    pub status: ModerationStatus,
    #[serde(flatten)]
    pub body: SubmissionBody,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Builds a fresh submission in `Pending` state with a v7 id and the
    /// creation timestamp fixed at this moment.
    pub fn new(
        name: String,
        email: String,
        body: SubmissionBody,
        attachment: Option<Attachment>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            email,
            status: ModerationStatus::Pending,
            body,
            attachment,
            created_at: Utc::now(),
        }
    }
}

/// An administrator credential. The password exists only as an Argon2 hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A raw upload as received by the transport layer, before validation and
/// before the attachment store has normalized it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub data: Vec<u8>,
    pub content_type: String,
    /// Client-supplied filename, used only to keep the extension in disk mode.
    pub original_name: String,
}

//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::error::Result;
use crate::models::{Admin, Attachment, ModerationStatus, Submission, Upload};
use async_trait::async_trait;
use uuid::Uuid;

/// Data persistence contract for submissions.
#[async_trait]
pub trait SubmissionRepo: Send + Sync {
    async fn create(&self, submission: &Submission) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Submission>>;
    /// All submissions in `status`, newest first.
    async fn list_by_status(&self, status: ModerationStatus) -> Result<Vec<Submission>>;
    /// Unconditional overwrite; returns the updated record, or `None` if
    /// nothing exists at `id`. Concurrent callers race last-write-wins.
    async fn set_status(&self, id: Uuid, status: ModerationStatus)
        -> Result<Option<Submission>>;
    /// Returns `false` if nothing existed at `id`.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Persistence contract for administrator credentials.
#[async_trait]
pub trait AdminRepo: Send + Sync {
    /// Fails with `Conflict` when the username or email is already taken.
    async fn create(&self, admin: &Admin) -> Result<()>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>>;
}

/// Attachment storage contract. The deployment picks one implementation at
/// startup (in-memory or disk-backed); both normalize the upload into the
/// same self-contained `Attachment` record.
///
/// Type/size validation happens in `validate::upload` before `ingest` is
/// called, so implementations only deal with well-formed uploads.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn ingest(&self, upload: Upload) -> Result<Attachment>;
}

/// Identity contract: password hashing and bearer token lifecycle.
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;
    /// Constant-effort comparison against the stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
    /// Issues a signed token embedding the admin identity, expiring in 1 day.
    fn issue_token(&self, admin_id: Uuid) -> Result<String>;
    /// Returns the embedded admin identity, or `Unauthenticated` for any
    /// malformed, tampered, or expired token.
    fn verify_token(&self, token: &str) -> Result<Uuid>;
}

/// Outbound notification contract. Callers treat delivery as best-effort:
/// the state change is already committed when these run, and failures are
/// logged rather than surfaced.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Alerts the operator that a new submission is waiting for review.
    async fn submission_received(&self, submission: &Submission) -> anyhow::Result<()>;
    /// Tells the submitter the outcome recorded in `submission.status`.
    async fn decision(&self, submission: &Submission) -> anyhow::Result<()>;
}

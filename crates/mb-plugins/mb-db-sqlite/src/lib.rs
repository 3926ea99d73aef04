//! # mb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `mb-core` domain models. Variant-specific submission
//! content lives in a JSON text column; attachment bytes in a BLOB column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mb_core::error::{AppError, Result};
use mb_core::models::{Admin, Attachment, ModerationStatus, Submission, SubmissionBody};
use mb_core::traits::{AdminRepo, SubmissionRepo};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS submissions (
        id                      BLOB PRIMARY KEY,
        name                    TEXT NOT NULL,
        email                   TEXT NOT NULL,
        status                  TEXT NOT NULL,
        body                    TEXT NOT NULL,
        attachment_locator      TEXT,
        attachment_payload      BLOB,
        attachment_content_type TEXT,
        created_at              TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS admins (
        id            BLOB PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    )",
];

pub struct SqliteRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if db.kind() == sqlx::error::ErrorKind::UniqueViolation {
            return AppError::Conflict("Username or email already exists".to_string());
        }
    }
    AppError::Internal(err.to_string())
}

fn row_to_submission(row: &SqliteRow) -> Result<Submission> {
    let body: SubmissionBody = serde_json::from_str(&row.get::<String, _>("body"))
        .map_err(|e| AppError::Internal(format!("corrupt submission body: {e}")))?;

    let content_type: Option<String> = row.get("attachment_content_type");
    let attachment = content_type.map(|content_type| Attachment {
        locator: row
            .get::<Option<String>, _>("attachment_locator")
            .map(Into::into),
        payload: row
            .get::<Option<Vec<u8>>, _>("attachment_payload")
            .unwrap_or_default(),
        content_type,
    });

    let status = ModerationStatus::parse(&row.get::<String, _>("status"))
        .ok_or_else(|| AppError::Internal("corrupt submission status".to_string()))?;

    Ok(Submission {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        name: row.get("name"),
        email: row.get("email"),
        status,
        body,
        attachment,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

impl SqliteRepo {
    /// Connects and ensures the schema exists. `sqlite::memory:` works for
    /// tests; file URLs need `?mode=rwc` to create the database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        // An in-memory SQLite database is private to one connection, so the
        // pool must never open a second one or it sees an empty schema.
        let max_connections = if url.contains("memory") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl SubmissionRepo for SqliteRepo {
    async fn create(&self, submission: &Submission) -> Result<()> {
        let (locator, payload, content_type) = match &submission.attachment {
            Some(a) => (
                a.locator.as_ref().map(|p| p.display().to_string()),
                Some(a.payload.clone()),
                Some(a.content_type.clone()),
            ),
            None => (None, None, None),
        };

        sqlx::query(
            "INSERT INTO submissions \
             (id, name, email, status, body, attachment_locator, attachment_payload, \
              attachment_content_type, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(submission.id))
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(submission.status.as_str())
        .bind(
            serde_json::to_string(&submission.body)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        )
        .bind(locator)
        .bind(payload)
        .bind(content_type)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Submission>> {
        let row = sqlx::query("SELECT * FROM submissions WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_submission).transpose()
    }

    async fn list_by_status(&self, status: ModerationStatus) -> Result<Vec<Submission>> {
        let rows = sqlx::query(
            "SELECT * FROM submissions WHERE status = ? ORDER BY created_at DESC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_submission).collect()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<Option<Submission>> {
        let result = sqlx::query("UPDATE submissions SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AdminRepo for SqliteRepo {
    async fn create(&self, admin: &Admin) -> Result<()> {
        sqlx::query(
            "INSERT INTO admins (id, username, email, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(admin.id))
        .bind(&admin.username)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let row = sqlx::query("SELECT * FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(|row| Admin {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
        }))
    }
}

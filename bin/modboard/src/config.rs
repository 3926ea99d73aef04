//! Environment-driven configuration, read once at startup.

use anyhow::{bail, Context};
use std::env;
use std::path::PathBuf;

/// Selects the attachment storage strategy for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Durable file under `upload_dir` plus the in-record payload.
    Disk,
    /// In-record payload only; no filesystem interaction.
    Memory,
}

impl StorageMode {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "disk" => Ok(StorageMode::Disk),
            "memory" => Ok(StorageMode::Memory),
            other => bail!("STORAGE_MODE must be 'disk' or 'memory', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub storage_mode: StorageMode,
    pub upload_dir: PathBuf,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    /// From-address on every outbound mail.
    pub mail_from: String,
    /// Fixed recipient for new-submission alerts.
    pub operator_email: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:modboard.db?mode=rwc".to_string()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            storage_mode: StorageMode::parse(
                &env::var("STORAGE_MODE").unwrap_or_else(|_| "disk".to_string()),
            )?,
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            smtp_host: env::var("SMTP_HOST").context("SMTP_HOST is required")?,
            smtp_username: env::var("SMTP_USERNAME").context("SMTP_USERNAME is required")?,
            smtp_password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is required")?,
            mail_from: env::var("MAIL_FROM").context("MAIL_FROM is required")?,
            operator_email: env::var("OPERATOR_EMAIL").context("OPERATOR_EMAIL is required")?,
        })
    }
}

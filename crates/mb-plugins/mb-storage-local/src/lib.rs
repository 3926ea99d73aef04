//! # mb-storage-local
//!
//! The two `AttachmentStore` implementations: a disk-backed store that
//! leaves a durable file next to the database record, and a buffered store
//! that never touches the filesystem. The binary picks one at startup from
//! the deployment mode; both normalize uploads into the same self-contained
//! `Attachment` record.

use async_trait::async_trait;
use mb_core::error::{AppError, Result};
use mb_core::models::{Attachment, Upload};
use mb_core::traits::AttachmentStore;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Keeps the upload buffer verbatim. No locator, no filesystem interaction.
pub struct MemoryAttachmentStore;

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn ingest(&self, upload: Upload) -> Result<Attachment> {
        Ok(Attachment {
            locator: None,
            payload: upload.data,
            content_type: upload.content_type,
        })
    }
}

/// Writes the upload to a collision-resistant path under `root`, then reads
/// the file back so the stored record is self-contained even though the file
/// also stays on disk.
///
/// The file and the database record are not written transactionally: a crash
/// between the two leaves an orphaned file, and deleting the submission does
/// not remove it. Accepted coupling, not silently cleaned up.
pub struct DiskAttachmentStore {
    root: PathBuf,
}

impl DiskAttachmentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `<millisecond-timestamp>-<random-int>.<original-extension>`
    fn unique_path(&self, original_name: &str) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen();
        let mut filename = format!("{millis}-{suffix}");
        if let Some(ext) = Path::new(original_name).extension().and_then(|e| e.to_str()) {
            filename.push('.');
            filename.push_str(ext);
        }
        self.root.join(filename)
    }
}

#[async_trait]
impl AttachmentStore for DiskAttachmentStore {
    async fn ingest(&self, upload: Upload) -> Result<Attachment> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("upload dir: {e}")))?;

        let path = self.unique_path(&upload.original_name);
        fs::write(&path, &upload.data)
            .await
            .map_err(|e| AppError::Internal(format!("write upload: {e}")))?;

        // Read-back guarantees the record holds exactly what landed on disk.
        let payload = fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("read upload back: {e}")))?;

        Ok(Attachment {
            locator: Some(path),
            payload,
            content_type: upload.content_type,
        })
    }
}

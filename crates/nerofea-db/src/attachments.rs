//! Attachment storage: blob backend plus metadata repository.
//!
//! Metadata rows live in PostgreSQL; the bytes live behind a
//! [`StorageBackend`]. Validation runs before any storage write, and a
//! failed metadata insert removes the just-written blob.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use nerofea_core::{
    defaults, file_safety, new_v7, Attachment, AttachmentStore, Error, Result,
};

/// Blob storage backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Generate a storage path for a blob id.
///
/// Path format: `blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin`, spreading
/// blobs across directories to keep listings manageable.
pub fn generate_storage_path(id: &Uuid) -> String {
    let hex = id.simple().to_string();
    format!("blobs/{}/{}/{}.bin", &hex[..2], &hex[2..4], hex)
}

/// Filesystem storage backend.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        tokio::fs::write(&full, data).await.map_err(Error::Io)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(self.full_path(path))
            .await
            .map_err(Error::Io)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(self.full_path(path))
            .await
            .map_err(Error::Io)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.full_path(path))
            .await
            .unwrap_or(false))
    }
}

/// PostgreSQL attachment repository over a blob storage backend.
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: Pool<Postgres>,
    backend: Arc<dyn StorageBackend>,
    max_size_bytes: u64,
}

impl PgAttachmentRepository {
    /// Create a repository with the given pool and backend.
    pub fn new(pool: Pool<Postgres>, backend: impl StorageBackend + 'static) -> Self {
        Self {
            pool,
            backend: Arc::new(backend),
            max_size_bytes: defaults::MAX_UPLOAD_SIZE_BYTES as u64,
        }
    }

    /// Override the upload size cap.
    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }
}

fn map_row_to_attachment(row: PgRow) -> Attachment {
    Attachment {
        id: row.get("id"),
        note_id: row.get("note_id"),
        user_id: row.get("user_id"),
        file_name: row.get("file_name"),
        storage_path: row.get("storage_path"),
        file_size: row.get("file_size"),
        mime_type: row.get("mime_type"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl AttachmentStore for PgAttachmentRepository {
    async fn upload(
        &self,
        note_id: Uuid,
        user_id: &str,
        file_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Attachment> {
        let validation = file_safety::validate_upload(mime_type, data, self.max_size_bytes);
        if !validation.allowed {
            return Err(Error::UploadRejected(
                validation
                    .block_reason
                    .unwrap_or_else(|| "Upload rejected".to_string()),
            ));
        }

        let id = new_v7();
        let storage_path = generate_storage_path(&id);
        let safe_name = file_safety::sanitize_filename(file_name);

        self.backend.write(&storage_path, data).await?;

        let now = Utc::now();
        let insert = sqlx::query(
            "INSERT INTO attachment
                 (id, note_id, user_id, file_name, storage_path, file_size, mime_type, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, note_id, user_id, file_name, storage_path, file_size, mime_type, created_at_utc",
        )
        .bind(id)
        .bind(note_id)
        .bind(user_id)
        .bind(&safe_name)
        .bind(&storage_path)
        .bind(data.len() as i64)
        .bind(mime_type)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match insert {
            Ok(row) => Ok(map_row_to_attachment(row)),
            Err(db_err) => {
                // Compensate: don't leave an orphaned blob behind.
                if let Err(cleanup_err) = self.backend.delete(&storage_path).await {
                    error!(
                        path = %storage_path,
                        error = %cleanup_err,
                        "Failed to clean up blob after metadata insert failure"
                    );
                }
                Err(Error::Database(db_err))
            }
        }
    }

    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Attachment>> {
        let rows = sqlx::query(
            "SELECT id, note_id, user_id, file_name, storage_path, file_size, mime_type, created_at_utc
             FROM attachment WHERE note_id = $1
             ORDER BY created_at_utc DESC",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_attachment).collect())
    }

    async fn download(&self, id: Uuid) -> Result<(Vec<u8>, String, String)> {
        let row = sqlx::query(
            "SELECT id, note_id, user_id, file_name, storage_path, file_size, mime_type, created_at_utc
             FROM attachment WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Attachment {} not found", id)))?;

        let attachment = map_row_to_attachment(row);
        let data = self.backend.read(&attachment.storage_path).await?;
        Ok((data, attachment.mime_type, attachment.file_name))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let row = sqlx::query("SELECT storage_path FROM attachment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Attachment {} not found", id)))?;

        let storage_path: String = row.get("storage_path");

        // A failed blob removal is logged, not fatal: the metadata row still
        // goes away and the blob becomes unreferenced.
        if let Err(storage_err) = self.backend.delete(&storage_path).await {
            warn!(
                attachment_id = %id,
                path = %storage_path,
                error = %storage_err,
                "Storage delete failed, removing metadata row anyway"
            );
        }

        sqlx::query("DELETE FROM attachment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path_shape() {
        let id = Uuid::nil();
        let path = generate_storage_path(&id);
        assert_eq!(
            path,
            "blobs/00/00/00000000000000000000000000000000.bin"
        );
    }

    #[test]
    fn test_storage_path_spreads_by_prefix() {
        let a = generate_storage_path(&new_v7());
        assert!(a.starts_with("blobs/"));
        assert!(a.ends_with(".bin"));
        assert_eq!(a.matches('/').count(), 3);
    }

    #[tokio::test]
    async fn test_filesystem_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        let path = generate_storage_path(&new_v7());
        backend.write(&path, b"attachment bytes").await.unwrap();
        assert!(backend.exists(&path).await.unwrap());

        let data = backend.read(&path).await.unwrap();
        assert_eq!(data, b"attachment bytes");

        backend.delete(&path).await.unwrap();
        assert!(!backend.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_filesystem_backend_missing_read_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        assert!(matches!(
            backend.read("blobs/aa/bb/missing.bin").await,
            Err(Error::Io(_))
        ));
    }
}

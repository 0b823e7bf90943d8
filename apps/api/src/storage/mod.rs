//! File storage for uploaded images and CVs.
//!
//! `AppState` holds an `Arc<dyn FileStorage>`, chosen at startup from
//! `STORAGE_BACKEND`. Handlers only deal in storage keys
//! (`images/<millis>-<uuid>.png`); the backend decides where the bytes live
//! and what URL the frontend gets.

pub mod disk;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use disk::DiskStorage;
pub use s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn save(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn load(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Removes a stored file. Missing files are not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL for a stored key, as handed to the frontend.
    fn url_for(&self, key: &str) -> Option<String>;
}

/// Deletes a file whose row no longer references it. Failures are logged,
/// never surfaced: the row change has already committed.
pub async fn discard(storage: &dyn FileStorage, key: Option<&str>) {
    let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
        return;
    };
    if crate::urls::is_absolute_url(key) {
        return;
    }
    match storage.delete(key).await {
        Ok(()) => tracing::info!("Removed stored file {key}"),
        Err(e) => tracing::warn!("Failed to remove stored file {key}: {e}"),
    }
}

/// Validates a key and returns its normalized form.
/// Rejects traversal segments and empty keys.
pub(crate) fn checked_key(key: &str) -> Result<String, StorageError> {
    let normalized = crate::urls::normalize_key(key);
    if normalized.is_empty() || normalized.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_key_rejects_traversal() {
        assert!(matches!(
            checked_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            checked_key("images/../../secret"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_checked_key_rejects_empty() {
        assert!(checked_key("").is_err());
        assert!(checked_key("/uploads/").is_err());
    }

    #[test]
    fn test_checked_key_normalizes_legacy_paths() {
        assert_eq!(checked_key("uploads\\cv\\a.pdf").unwrap(), "cv/a.pdf");
        assert_eq!(checked_key("/images/a.png").unwrap(), "images/a.png");
    }
}

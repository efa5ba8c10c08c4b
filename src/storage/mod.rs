//! Object storage seam.
//!
//! The pipeline only needs three calls against a bucket: fetch the bytes of
//! an object, write bytes with a content type, and delete. [`ObjectStore`]
//! captures exactly that so the handlers can run against S3 in production
//! and an in-memory recording store in tests.
//!
//! Keys passed through this trait are always decoded (`my trip/full/a b.jpg`),
//! never the form-encoded spelling found in notifications.

pub mod s3;

pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },
    #[error("failed to read {bucket}/{key}: {message}")]
    Read {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("failed to write {bucket}/{key}: {message}")]
    Put {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("failed to delete {bucket}/{key}: {message}")]
    Delete {
        bucket: String,
        key: String,
        message: String,
    },
}

impl StorageError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Byte-blob storage addressed by bucket and key.
///
/// Implementations must be safe to share across the concurrent per-size
/// tasks of one notification.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the whole object body.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Delete an object. May report [`StorageError::NotFound`] for an absent
    /// key; callers that want idempotent deletes treat that as success.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

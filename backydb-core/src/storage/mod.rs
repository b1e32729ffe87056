//! Pluggable blob storage (spec §4.6).

mod local;
mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

use async_trait::async_trait;

use crate::error::BackyError;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<String, BackyError>;
    async fn get(&self, name: &str) -> Result<Vec<u8>, BackyError>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackyError>;
    async fn delete(&self, name: &str) -> Result<(), BackyError>;
}

/// Shared retry policy for transient storage failures (spec §4.6: 5
/// attempts, capped at 30s — same shape as the Key Provider's backoff in
/// `backydb-keystore`, different ceiling).
pub fn retry_policy() -> backydb_keystore::Backoff {
    backydb_keystore::Backoff::new(5, std::time::Duration::from_millis(250), std::time::Duration::from_secs(30))
}

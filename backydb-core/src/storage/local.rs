//! Local filesystem storage: atomic `.partial` -> final `rename` (spec
//! §4.6), grounded on the teacher's `FileBackend::put` pattern.

use std::path::PathBuf;

use async_trait::async_trait;

use super::StorageBackend;
use crate::error::BackyError;

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn final_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.partial"))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<String, BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.put_once(name, bytes)).await
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.get_once(name)).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.list_once(prefix)).await
    }

    async fn delete(&self, name: &str) -> Result<(), BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.delete_once(name)).await
    }
}

impl LocalStorage {
    async fn put_once(&self, name: &str, bytes: &[u8]) -> Result<String, BackyError> {
        let final_path = self.final_path(name);
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        }
        let partial_path = self.partial_path(name);
        tokio::fs::write(&partial_path, bytes)
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        tokio::fs::rename(&partial_path, &final_path)
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        Ok(final_path.to_string_lossy().into_owned())
    }

    async fn get_once(&self, name: &str) -> Result<Vec<u8>, BackyError> {
        let path = self.final_path(name);
        tokio::fs::read(&path)
            .await
            .map_err(|_| BackyError::StorageNotFound(name.to_string()))
    }

    async fn list_once(&self, prefix: &str) -> Result<Vec<String>, BackyError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| BackyError::StorageUnavailable(e.to_string()))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(prefix) && !name.ends_with(".partial") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_once(&self, name: &str) -> Result<(), BackyError> {
        let path = self.final_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackyError::StorageUnavailable(e.to_string())),
        }
    }
}

impl LocalStorage {
    /// Remove a dangling `.partial` file left by a cancelled upload (spec
    /// §5 "Cancellation": "Local: unlink the `.partial`").
    pub async fn abort_partial(&self, name: &str) -> Result<(), BackyError> {
        let path = self.partial_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackyError::StorageUnavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.put("dump.sql", b"CREATE TABLE t (id INT);").await.unwrap();
        let bytes = storage.get("dump.sql").await.unwrap();
        assert_eq!(bytes, b"CREATE TABLE t (id INT);");
    }

    #[tokio::test]
    async fn put_leaves_no_partial_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.put("dump.sql", b"data").await.unwrap();
        assert!(!dir.path().join("dump.sql.partial").exists());
    }

    #[tokio::test]
    async fn get_missing_is_storage_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let result = storage.get("missing.sql").await;
        assert!(matches!(result, Err(BackyError::StorageNotFound(_))));
    }

    #[tokio::test]
    async fn list_filters_by_prefix_and_excludes_partials() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.put("job1-dump.sql", b"a").await.unwrap();
        storage.put("job2-dump.sql", b"b").await.unwrap();
        tokio::fs::write(dir.path().join("job1-dump.sql.partial"), b"c").await.unwrap();

        let names = storage.list("job1").await.unwrap();
        assert_eq!(names, vec!["job1-dump.sql".to_string()]);
    }
}

// clipscrub-core/src/storage/file.rs
//! Directory-backed key-value store: one pretty-printed JSON file per key.
//!
//! Writes go to a uniquely named temporary file in the same directory which
//! is then renamed over the target, so a crash mid-write leaves the previous
//! document intact. Key locks are advisory `fs2` locks on a `<key>.lock`
//! sidecar and hold across processes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::errors::{ClipscrubError, Result};
use crate::storage::{KeyLock, KeyValueStore};

const FILE_EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "lock";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ClipscrubError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, FILE_EXTENSION)))
    }
}

fn blocking_task_failed(e: tokio::task::JoinError) -> ClipscrubError {
    ClipscrubError::Storage(format!("storage task failed: {}", e))
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn lock(&self, key: &str) -> Result<KeyLock> {
        let lock_path = self.path_for(key)?.with_extension(LOCK_EXTENSION);
        tokio::fs::create_dir_all(&self.dir).await?;

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)?;
            fs2::FileExt::lock_exclusive(&file)?;
            Ok(file)
        })
        .await
        .map_err(blocking_task_failed)??;

        debug!("Acquired lock for key '{}'", key);
        Ok(KeyLock::new(file))
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored document at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&bytes)?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(key)?;
        let dir = self.dir.clone();
        let json = serde_json::to_vec_pretty(&value)?;
        let len = json.len();

        let written = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&written).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(blocking_task_failed)??;

        debug!("Wrote {} bytes to {}", len, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state"));
        assert!(store.get("rules").await.unwrap().is_none());

        store.set("rules", json!({"sites": ["a"], "rules": []})).await.unwrap();
        let reopened = JsonFileStore::new(dir.path().join("state"));
        assert_eq!(
            reopened.get("rules").await.unwrap(),
            Some(json!({"sites": ["a"], "rules": []}))
        );
        assert_eq!(entry_names(&dir.path().join("state")), vec!["rules.json".to_string()]);
    }

    fn entry_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_writers_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = JsonFileStore::new(dir.path());
                tokio::spawn(async move { store.set("rules", json!({"writer": i})).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = JsonFileStore::new(dir.path()).get("rules").await.unwrap().unwrap();
        assert!(stored["writer"].is_u64());
        assert_eq!(entry_names(dir.path()), vec!["rules.json".to_string()]);
    }

    #[tokio::test]
    async fn test_lock_blocks_second_handle_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let first = JsonFileStore::new(dir.path());
        let second = JsonFileStore::new(dir.path());

        let held = first.lock("rules").await.unwrap();
        let waiting = tokio::time::timeout(std::time::Duration::from_millis(50), second.lock("rules")).await;
        assert!(waiting.is_err());

        drop(held);
        assert!(second.lock("rules").await.is_ok());
        assert!(dir.path().join("rules.lock").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(store.get("../etc").await, Err(ClipscrubError::Storage(_))));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rules.json"), b"{not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(store.get("rules").await, Err(ClipscrubError::Serialization(_))));
    }
}

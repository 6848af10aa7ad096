//! Flat JSON file subscriber store.
//!
//! The file holds a single JSON array of user ids, e.g. `[1, 2, 3]`.
//! It is read once when the store opens and rewritten in full whenever a
//! new id is added.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::store::SubscriberStore;
use crate::error::StoreResult;

/// Subscriber store persisted to a JSON array file.
pub struct JsonSubscriberStore {
    path: PathBuf,
    ids: Mutex<Vec<u64>>,
}

impl JsonSubscriberStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let ids: Vec<u64> = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Loaded {} subscribers from {}", ids.len(), path.display());

        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    /// Replace the file contents via a temp file and rename.
    async fn persist(path: &Path, ids: &[u64]) -> StoreResult<()> {
        let bytes = serde_json::to_vec(ids)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for JsonSubscriberStore {
    async fn save(&self, id: u64, _name: Option<&str>) -> StoreResult<bool> {
        let mut ids = self.ids.lock().await;
        if ids.contains(&id) {
            return Ok(false);
        }

        ids.push(id);
        if let Err(e) = Self::persist(&self.path, &ids).await {
            ids.pop();
            return Err(e);
        }

        debug!("Saved subscriber {} to {}", id, self.path.display());
        Ok(true)
    }

    async fn list_ids(&self) -> StoreResult<Vec<u64>> {
        Ok(self.ids.lock().await.clone())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.ids.lock().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir().join(format!(
            "gatekeeper-{}-{}-{}.json",
            tag,
            std::process::id(),
            nanos
        ))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let path = temp_path("missing");
        let store = JsonSubscriberStore::open(&path).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_ids().await.unwrap().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let path = temp_path("idempotent");
        let store = JsonSubscriberStore::open(&path).await.unwrap();

        assert!(store.save(5, Some("Eve")).await.unwrap());
        assert!(!store.save(5, Some("Eve")).await.unwrap());

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.list_ids().await.unwrap(), vec![5]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_reopen_keeps_insertion_order() {
        let path = temp_path("reopen");
        {
            let store = JsonSubscriberStore::open(&path).await.unwrap();
            for id in [3, 1, 2] {
                store.save(id, None).await.unwrap();
            }
        }

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "[3,1,2]");

        let reopened = JsonSubscriberStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_ids().await.unwrap(), vec![3, 1, 2]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_malformed_file_is_rejected() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonSubscriberStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Json(_))));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = std::env::temp_dir().join(format!("gatekeeper-missing-dir-{}", std::process::id()));
        let path = dir.join("users.json");
        let store = JsonSubscriberStore::open(&path).await.unwrap();

        let result = store.save(1, None).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}

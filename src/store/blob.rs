use crate::error::{StoreError, StoreResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// A string-keyed store of whole string values.
///
/// Reads and writes always cover the full value, there is no partial access.
pub trait BlobStorage: Send + Sync + 'static {
    /// Read the value stored under `key`, `None` if nothing was ever written
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>>;

    /// Replace the value stored under `key`
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>>;
}

/// Blob storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryBlobStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStorage for MemoryBlobStorage {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
        async move { Ok(self.values.read().await.get(key).cloned()) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.values.write().await.insert(key.to_string(), value);
            Ok(())
        }
        .boxed()
    }
}

/// Blob storage keeping one `<key>.json` file per key inside a directory.
///
/// Writes go to a temporary sibling file first and are then renamed over the
/// target, so a crash mid-write leaves the previous value intact.
pub struct FileBlobStorage {
    dir: PathBuf,
}

impl FileBlobStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStorage for FileBlobStorage {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
        async move {
            let path = self.path_for(key);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!("Jobmark: No blob at {}", path.display());
                    Ok(None)
                }
                Err(err) => Err(StoreError::Read(format!("{}: {}", path.display(), err))),
            }
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let path = self.path_for(key);
            let tmp_path = self.dir.join(format!("{}.json.tmp", key));
            let write_err =
                |err: std::io::Error| StoreError::Write(format!("{}: {}", path.display(), err));

            tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;
            tokio::fs::write(&tmp_path, value).await.map_err(write_err)?;
            tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("jobmark-test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_memory_get_set() {
        let storage = MemoryBlobStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);

        storage.set("k", "[1]".to_string()).await.unwrap();
        storage.set("k", "[2]".to_string()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("[2]"));
    }

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let dir = scratch_dir();
        {
            let storage = FileBlobStorage::new(&dir);
            assert_eq!(storage.get("bookmarks").await.unwrap(), None);
            storage.set("bookmarks", "[]".to_string()).await.unwrap();
            storage.set("bookmarks", "[{\"id\":1}]".to_string()).await.unwrap();
        }

        let reopened = FileBlobStorage::new(&dir);
        assert_eq!(
            reopened.get("bookmarks").await.unwrap().as_deref(),
            Some("[{\"id\":1}]")
        );
        assert!(!dir.join("bookmarks.json.tmp").exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_read_error() {
        let dir = scratch_dir();
        // a directory where the file should be cannot be read as a string
        tokio::fs::create_dir_all(dir.join("broken.json")).await.unwrap();

        let storage = FileBlobStorage::new(&dir);
        assert!(matches!(
            storage.get("broken").await,
            Err(StoreError::Read(_))
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

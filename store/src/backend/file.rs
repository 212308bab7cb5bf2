//! On-disk backend: one `<key>.json` file per key.

use super::{check_key, check_size, RecordStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Stores each value in its own file under a data directory.
///
/// Writes go to a temporary sibling first and are renamed over the target,
/// so readers see either the old value or the new one in full.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    max_value_bytes: Option<usize>,
}

impl FileStore {
    /// Open (creating if needed) the data directory at `root`.
    pub async fn open(root: impl Into<PathBuf>, max_value_bytes: Option<usize>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::StorageWrite {
                key: root.display().to_string(),
                source,
            })?;

        tracing::debug!(root = %root.display(), "opened file store");
        Ok(Self {
            root,
            max_value_bytes,
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::StorageRead {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        check_size(key, &value, self.max_value_bytes)?;

        let tmp = self
            .root
            .join(format!(".{key}.json.tmp.{}", uuid::Uuid::new_v4()));

        if let Err(source) = write_atomic(&tmp, &path, value.as_bytes()).await {
            // The target is untouched; only the temporary file may be left.
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::StorageWrite {
                key: key.to_string(),
                source,
            });
        }

        Ok(())
    }
}

async fn write_atomic(tmp: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(tmp, path).await?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent).await {
            let _ = dir.sync_all().await;
        }
    }
    Ok(())
}

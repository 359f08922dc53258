//! Filesystem store for uploaded school images.
//!
//! Files live in `<root>/schoolImages/<filename>` and are addressed by their
//! declared name, so a second upload with the same name replaces the first.
//! Writes go to a temporary sibling and are renamed into place, which keeps a
//! failed or concurrent write from leaving a torn file under the final name.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::fs;

use crate::types::{AssetReference, UploadedAsset};

pub const ASSET_DIR_NAME: &str = "schoolImages";
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

// Handshake between a caller's deadline and the blocking writer: whichever
// side moves the state off PENDING first decides the outcome.
const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid asset file name {0:?}")]
    InvalidFileName(String),
    #[error("failed to create asset directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write asset {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read asset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("asset write timed out after {0:?}")]
    Timeout(Duration),
    #[error("asset write task failed: {0}")]
    Task(String),
}

/// True when `name` can be used as a single path component.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[derive(Clone, Debug)]
pub struct AssetStore {
    dir: PathBuf,
    timeout: Duration,
}

impl AssetStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            dir: root.as_ref().join(ASSET_DIR_NAME),
            timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Writes the asset under its declared name.
    ///
    /// On timeout the caller gets [`StorageError::Timeout`] and the writer,
    /// which keeps running on the blocking pool, removes its temporary file
    /// instead of renaming it. If the rename had already begun, its result is
    /// awaited and returned.
    pub async fn store(&self, asset: UploadedAsset) -> Result<AssetReference, StorageError> {
        if !is_plain_file_name(&asset.filename) {
            return Err(StorageError::InvalidFileName(asset.filename));
        }

        let path = self.dir.join(&asset.filename);
        let len = asset.len();
        let state = Arc::new(AtomicU8::new(PENDING));
        let mut task = {
            let dir = self.dir.clone();
            let path = path.clone();
            let tmp = self.tmp_path(&path);
            let state = state.clone();
            let timeout = self.timeout;
            tokio::task::spawn_blocking(move || {
                write_atomically(&dir, &path, &tmp, &asset.bytes, &state, timeout)
            })
        };

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                if state
                    .compare_exchange(PENDING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    log::warn!(
                        "Asset write {} exceeded {:?}, abandoning",
                        path.display(),
                        self.timeout
                    );
                    return Err(StorageError::Timeout(self.timeout));
                }
                task.await
            }
        };
        joined.map_err(|e| StorageError::Task(e.to_string()))??;

        log::debug!("stored asset {} ({} bytes)", path.display(), len);
        Ok(AssetReference::new(format!(
            "/{}/{}",
            ASSET_DIR_NAME,
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        )))
    }

    /// Maps a reference produced by [`AssetStore::store`] back to its file.
    pub fn resolve(&self, reference: &AssetReference) -> Option<PathBuf> {
        let prefix = format!("/{}/", ASSET_DIR_NAME);
        let name = reference.as_str().strip_prefix(&prefix)?;
        self.path_for(name)
    }

    pub fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        is_plain_file_name(file_name).then(|| self.dir.join(file_name))
    }

    /// Reads a stored file by name; `Ok(None)` when it does not exist.
    pub async fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self
            .path_for(file_name)
            .ok_or_else(|| StorageError::InvalidFileName(file_name.to_string()))?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn tmp_path(&self, path: &Path) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.dir
            .join(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
    }
}

fn write_atomically(
    dir: &Path,
    path: &Path,
    tmp: &Path,
    bytes: &[u8],
    state: &AtomicU8,
    timeout: Duration,
) -> Result<(), StorageError> {
    if state.load(Ordering::SeqCst) == ABANDONED {
        return Err(StorageError::Timeout(timeout));
    }
    std::fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    if let Err(source) = std::fs::write(tmp, bytes) {
        let _ = std::fs::remove_file(tmp);
        return Err(StorageError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    if state
        .compare_exchange(PENDING, COMMITTED, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        let _ = std::fs::remove_file(tmp);
        return Err(StorageError::Timeout(timeout));
    }
    if let Err(source) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(StorageError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

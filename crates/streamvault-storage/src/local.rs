use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs;
use tokio::io::AsyncRead;

use crate::allocation::StorageAllocation;
use crate::error::{StorageError, StorageResult};

/// Attempts to find an unused base token before giving up.
const MAX_ALLOCATION_ATTEMPTS: usize = 8;

/// An original written to disk together with the allocation it reserved.
#[derive(Debug, Clone)]
pub struct StoredOriginal {
    pub allocation: StorageAllocation,
    pub bytes_written: u64,
}

impl StoredOriginal {
    pub fn path(&self) -> PathBuf {
        self.allocation.original_path()
    }
}

/// Local filesystem storage for originals and derived artifacts.
///
/// All files live directly under `base_path`; names come from [`StorageAllocation`].
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the root directory if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let storage = LocalStorage {
            base_path: base_path.into(),
        };
        storage.ensure_root().await?;
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn ensure_root(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })
    }

    /// Reserve a fresh set of paths for an upload.
    ///
    /// Nothing is written; the root is (re)created so later writes have a place to land.
    pub async fn allocate(
        &self,
        original_filename: Option<&str>,
    ) -> StorageResult<StorageAllocation> {
        self.ensure_root().await?;
        Ok(StorageAllocation::generate(&self.base_path, original_filename))
    }

    /// Stream an upload to a freshly allocated original path.
    ///
    /// The file is created exclusively, so an existing file is never overwritten; a
    /// colliding token is replaced with a new one. A partially written file is removed
    /// when the copy fails.
    pub async fn store_original(
        &self,
        original_filename: Option<&str>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<StoredOriginal> {
        let start = std::time::Instant::now();

        let (allocation, mut file) = self.create_original(original_filename).await?;
        let path = allocation.original_path();

        let copied = async {
            let bytes = tokio::io::copy(&mut reader, &mut file).await?;
            file.sync_all().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        let bytes_written = match copied {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(file);
                if let Err(cleanup) = self.remove_if_exists(&path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %cleanup,
                        "Failed to remove partial upload"
                    );
                }
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::info!(
            path = %path.display(),
            size_bytes = bytes_written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(StoredOriginal {
            allocation,
            bytes_written,
        })
    }

    async fn create_original(
        &self,
        original_filename: Option<&str>,
    ) -> StorageResult<(StorageAllocation, fs::File)> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let allocation = self.allocate(original_filename).await?;
            let path = allocation.original_path();

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((allocation, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "Allocated path already taken, retrying");
                    continue;
                }
                Err(e) => {
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to create file {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(StorageError::UploadFailed(format!(
            "No free file name after {} attempts",
            MAX_ALLOCATION_ATTEMPTS
        )))
    }

    /// Remove a file. Returns `false` when there was nothing to remove.
    pub async fn remove_if_exists(&self, path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Local storage delete successful");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Open a stored file for reading along with its length in bytes.
    pub async fn open(&self, path: &Path) -> StorageResult<(fs::File, u64)> {
        let file = fs::File::open(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                StorageError::IoError(e)
            }
        })?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }
}

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for file system operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FileSystemError {
    /// Error when encountering an IO issue
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The key resolved to a location outside the output root
    #[error("Path '{path}' escapes output root '{}'", root.display())]
    PathTraversal { path: String, root: PathBuf },
}

/// Result type for file system operations
pub type FileSystemResult<T> = Result<T, FileSystemError>;

/// What a successful call to [`PayloadStore::write`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The payload was written to this absolute path
    Written(PathBuf),
    /// No output root is configured; nothing was written
    Skipped,
}

/// PayloadStore defines the port (interface) for persisting audit artifacts
#[async_trait]
pub trait PayloadStore: Send + Sync + 'static {
    /// Write `data` under the store's root at the location named by `key`.
    ///
    /// # Arguments
    /// * `key` - Relative location, usually an URL path such as `/upload.php`
    /// * `data` - Payload to write
    ///
    /// # Returns
    /// The outcome of the write, or an error if the key escapes the root or I/O fails
    async fn write(&self, key: &str, data: &[u8]) -> FileSystemResult<WriteOutcome>;

    /// Best-effort variant of [`PayloadStore::write`] for the forwarding path.
    /// Failures are logged and swallowed.
    async fn persist(&self, key: &str, data: &[u8]) {
        match self.write(key, data).await {
            Ok(WriteOutcome::Written(path)) => {
                tracing::debug!("Wrote {} bytes to {}", data.len(), path.display());
            }
            Ok(WriteOutcome::Skipped) => {}
            Err(FileSystemError::PathTraversal { path, root }) => {
                tracing::warn!(
                    "URL path received: '{}' - attempted to break out of path '{}'; denied",
                    path,
                    root.display()
                );
            }
            Err(e) => {
                tracing::error!("Failed to persist payload for '{}': {}", key, e);
            }
        }
    }
}

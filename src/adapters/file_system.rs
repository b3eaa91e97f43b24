use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::ports::file_system::{FileSystemError, FileSystemResult, PayloadStore, WriteOutcome};

/// File system adapter writing audit artifacts below a single output root.
///
/// Keys are resolved lexically (no symlink resolution, the target need not exist) and
/// any key whose normalized location leaves the root is refused.
#[derive(Debug, Default, Clone)]
pub struct FileSystemAdapter {
    root: Option<PathBuf>,
}

impl FileSystemAdapter {
    /// Create an adapter rooted at `root`. `None` turns every write into a no-op.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve `key` against `root`, refusing anything that does not land strictly inside it.
    fn resolve(root: &Path, key: &str) -> FileSystemResult<PathBuf> {
        let root = normalize(&std::path::absolute(root)?);
        let target = normalize(&root.join(key.trim_start_matches('/')));

        if target == root || !target.starts_with(&root) {
            return Err(FileSystemError::PathTraversal {
                path: key.to_string(),
                root,
            });
        }

        Ok(target)
    }
}

#[async_trait]
impl PayloadStore for FileSystemAdapter {
    async fn write(&self, key: &str, data: &[u8]) -> FileSystemResult<WriteOutcome> {
        let Some(root) = &self.root else {
            return Ok(WriteOutcome::Skipped);
        };

        let target = Self::resolve(root, key)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, data).await?;

        Ok(WriteOutcome::Written(target))
    }
}

/// Lexical normalization: drops `.` and lets `..` remove the preceding component.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

//! File system document store
//!
//! Pages are written as individual files into a single output directory.
//! The directory is expected to exist before the crawl starts; see
//! [`prepare_output_dir`].

use crate::storage::traits::{DocStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each page as `<docs-dir>/<name>`
#[derive(Debug, Clone)]
pub struct FsDocStore {
    dir: PathBuf,
}

impl FsDocStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DocStorage for FsDocStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        tokio::fs::write(self.dir.join(name), bytes)
            .await
            .map_err(|source| StorageError::Write {
                name: name.to_string(),
                source,
            })
    }
}

/// Creates the output directory, removing previous documents first if `clear`
///
/// # Arguments
///
/// * `dir` - The docs directory
/// * `clear` - Whether to delete any existing directory and its contents
pub async fn prepare_output_dir(dir: &Path, clear: bool) -> StorageResult<()> {
    if clear {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => tracing::debug!("Removed old documents in {}", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

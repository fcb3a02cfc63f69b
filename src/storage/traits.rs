//! Storage traits and error types
//!
//! This module defines the capability the crawler uses to persist fetched
//! pages, and its error type.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while persisting a page
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write document '{name}': {source}")]
    Write {
        name: String,
        source: std::io::Error,
    },

    #[error("Invalid document name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Write-only document sink for fetched pages
///
/// Implementations must be safe to call from many workers at once.
#[async_trait]
pub trait DocStorage: Send + Sync {
    /// Stores `bytes` under the flat document `name`
    async fn put(&self, name: &str, bytes: &[u8]) -> StorageResult<()>;
}

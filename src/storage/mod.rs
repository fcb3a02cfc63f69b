//! Storage module for persisting fetched pages
//!
//! This module handles:
//! - The [`DocStorage`] capability workers write pages through
//! - A file system implementation writing one flat file per page
//! - Output directory setup before a crawl

mod fs;
mod traits;

pub use fs::{prepare_output_dir, FsDocStore};
pub use traits::{DocStorage, StorageError, StorageResult};

//! Error types for the storage layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage directory unavailable: {}", .0.display())]
    NoDirectory(PathBuf),

    #[error("Storage write rejected: {0}")]
    Rejected(String),
}

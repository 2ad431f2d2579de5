use crate::store::remote::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Library item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid backup file: {0}")]
    Backup(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, InsightError>;

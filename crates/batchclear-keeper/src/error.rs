//! Error types for the keeper tool

use batchclear_core::ClearingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Settlement error: {0}")]
    Settlement(#[from] ClearingError),
}

impl KeeperError {
    pub fn invalid_parameter(name: &str, value: &str, expected: &str) -> Self {
        KeeperError::InvalidConfig(format!("{} = {} (expected {})", name, value, expected))
    }
}

impl From<std::io::Error> for KeeperError {
    fn from(err: std::io::Error) -> Self {
        KeeperError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for KeeperError {
    fn from(err: serde_json::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

pub type KeeperResult<T> = Result<T, KeeperError>;

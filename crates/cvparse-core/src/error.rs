use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::{RecognitionError, SourceError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Applicant must be at least 18 (got {age})")]
    Underage { age: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;

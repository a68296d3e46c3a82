// Music Replay Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error in {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl ReplayError {
    pub fn parse(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        ReplayError::Parse {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplayError>;

use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrubError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Decode failure: {0}")]
    DecodeFailure(String),
    #[error("Parse failure: {0}")]
    ParseFailure(String),
    #[error("Write failure: {0}")]
    WriteFailure(String),
    #[error("Restore failure: {0}")]
    RestoreFailure(String),
    #[error("Permission failure: {0}")]
    PermissionFailure(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Store busy: {0} is already being mutated")]
    Busy(String),
    #[error("All {0} targeted store(s) failed")]
    AllStoresFailed(usize),
}

impl ScrubError {
    /// Content of the store could not be understood in its format.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ScrubError::ParseFailure(_) | ScrubError::JsonError(_)
        )
    }

    /// I/O went wrong while reading, writing, or backing up a store.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            ScrubError::WriteFailure(_) | ScrubError::IoError(_) | ScrubError::RusqliteError(_)
        )
    }
}

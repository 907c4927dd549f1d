use std::path::PathBuf;

/// Errors that can occur when building or operating a file sink.
///
/// Only construction surfaces these to callers. Failures inside the write
/// path are reported on stderr and the affected line is dropped.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Invalid log path '{0}': {1}")]
    InvalidPath(PathBuf, String),
    #[error("Invalid maximum file size: must be greater than 0")]
    InvalidMaxFileSize,
    #[error("Invalid flush interval: must be greater than 0 ms in buffered mode")]
    InvalidFlushInterval,
    #[error("Invalid buffer watermark: must be greater than 0 lines")]
    InvalidBufferLines,
    #[error("Invalid timestamp format '{0}'")]
    InvalidTimestampFormat(String),
    #[error("Failed to create directory '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Failed to create file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
    #[error("Failed to rename file from '{from}' to '{to}': {error}")]
    RenameFileError { from: PathBuf, to: PathBuf, error: String },
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFileError { path: PathBuf, error: String },
    #[error("File IO error: {0}")]
    FileIOError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SinkError {
    /// Whether this error was raised by option validation, before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SinkError::InvalidPath(..)
                | SinkError::InvalidMaxFileSize
                | SinkError::InvalidFlushInterval
                | SinkError::InvalidBufferLines
                | SinkError::InvalidTimestampFormat(_)
        )
    }
}

// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed input at line {line}: {message}")]
    MalformedInput { line: u64, message: String },

    /// A data row is too short to map every document field.
    #[error("Row at line {line} has {found} fields, at least {required} required")]
    FieldMissing {
        line: u64,
        found: usize,
        required: usize,
    },

    #[error("0 records read from source; aborting before touching index {index}")]
    EmptySnapshot { index: String },

    #[error("Index store error during {operation}: {message}")]
    StoreUnavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    /// The blocking parse task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl SyncError {
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            operation,
            message: message.into(),
        }
    }

    /// Stable short name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::MalformedInput { .. } => "malformed_input",
            Self::FieldMissing { .. } => "field_missing",
            Self::EmptySnapshot { .. } => "empty_snapshot",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::Validation(_) => "validation",
            Self::TaskFailed(_) => "task_failed",
        }
    }
}

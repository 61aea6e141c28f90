//! Error types for stores, the host scheduler, and the service layer.

use std::path::PathBuf;

use tasknotify_core::ParseError;

/// Settings or task persistence failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The host scheduler refused or failed a job registration.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("job registry error: {0}")]
    Registry(#[from] StoreError),

    #[error("job '{name}' rejected: {reason}")]
    Rejected { name: String, reason: String },
}

/// Errors surfaced by the settings and task services.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid input: {0}")]
    Invalid(String),
}

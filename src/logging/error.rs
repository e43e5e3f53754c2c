use std::io;

/// Errors surfaced by the logging setup path.
///
/// Dispatch itself never returns these; only initialization and handler
/// construction do.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("logging is already initialized")]
    AlreadyInitialized,

    #[error("invalid handler '{name}': {reason}")]
    InvalidHandler { name: String, reason: String },

    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Failure of a single handler write. Reported, never propagated to callers.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

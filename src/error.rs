use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid entity key: {0:?}")]
    InvalidKey(String),

    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("duplicate entity key {key} in {source_name}")]
    DuplicateKey { key: String, source_name: String },

    #[error("column {column:?} not found in {path}")]
    MissingColumn { column: String, path: String },

    #[error("failed to read table {path}: {message}")]
    TableRead { path: String, message: String },

    #[error("failed to write table {path}: {message}")]
    TableWrite { path: String, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(String),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to start download worker: {0}")]
    WorkerSpawn(String),

    #[error("download worker panicked: {0}")]
    WorkerPanicked(String),
}

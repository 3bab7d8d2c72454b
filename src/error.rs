// Error taxonomy shared by the pipeline stages.
//
// Watch errors are fatal: the caller is expected to stop the process. Upload
// and clipboard errors only end the current cycle.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Problems resolving the directory and client ID from the command line.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "only one argument provided and it is a directory ({}); please provide a client ID",
        .0.display()
    )]
    MissingClientId(PathBuf),

    #[error("HOME environment variable is not set")]
    HomeNotSet,
}

/// Failures of the directory monitor. None of these are retried.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to create filesystem monitor: {0}")]
    Init(#[source] notify::Error),

    #[error("cannot watch '{}': {}", .path.display(), .source)]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to read filesystem events: {0}")]
    Read(#[source] notify::Error),

    #[error("filesystem event stream closed unexpectedly")]
    Disconnected,
}

/// Failures of the HTTP exchange itself, before any body is looked at.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("could not connect: {0}")]
    Connect(String),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Short numeric code printed alongside upload failures. HTTP statuses are
    /// reported as-is, the rest use small fixed values.
    pub fn code(&self) -> u16 {
        match self {
            TransportError::Timeout => 28,
            TransportError::Connect(_) => 7,
            TransportError::Status(status) => *status,
            TransportError::Body(_) => 23,
            TransportError::Other(_) => 1,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// The response body was not valid JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid JSON at line {line}, column {column}: {message} (error before: {fragment:?})")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Remaining input starting where the parser gave up, truncated.
    pub fragment: String,
}

/// Per-cycle upload failures.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("file provided does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("image upload failed ({}): {}", .0.code(), .0)]
    Transport(TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no link found in upload response")]
    NoLink,
}

impl From<TransportError> for UploadError {
    fn from(err: TransportError) -> Self {
        UploadError::Transport(err)
    }
}

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("invalid clipboard command: {0}")]
    Command(String),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard command I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("clipboard command exited with {0}")]
    Exit(ExitStatus),
}

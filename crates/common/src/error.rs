//! Common error types for hostprobe.

use thiserror::Error;

/// Error raised by host accessors and the surrounding tooling.
///
/// Probes never surface this type to their callers; they fold it into an
/// absent result.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH connection failed: {0}")]
    SshConnection(String),

    #[error("SSH authentication failed: {0}")]
    SshAuth(String),

    #[error("Command execution failed: {cmd} - {reason}")]
    CommandExecution { cmd: String, reason: String },

    #[error("File read failed: {path} - {reason}")]
    FileRead { path: String, reason: String },

    #[error("Unsupported OS: {0}")]
    UnsupportedOs(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

//! Error taxonomy for the recorder.
//!
//! Steady-state errors are logged where they happen; only startup failures
//! (configuration, first token exchange, directory creation) bubble up to
//! `main` through `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Token exchange failed or returned an unusable body.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Timeouts, 5xx responses, connection errors.
    #[error("network error: {0}")]
    Network(String),

    /// The configured channel does not exist.
    #[error("channel not found: {0}")]
    NotFound(String),

    #[error("filesystem error on {path:?}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Subprocess {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RecorderError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub fn subprocess(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Subprocess {
            program: program.into(),
            source,
        }
    }
}

pub type RecorderResult<T> = Result<T, RecorderError>;

use std::path::PathBuf;

use thiserror::Error;

/// Why a recording did not start, or why it ended early.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Capture region unavailable: {0}")]
    RegionUnavailable(String),

    #[error("No video encoder could be opened for {}: {}", path.display(), attempts.join("; "))]
    EncoderUnavailable {
        path: PathBuf,
        attempts: Vec<String>,
    },

    #[error("Capture region lost: {0}")]
    RegionLost(String),

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Encoder failed: {0}")]
    EncoderFailed(String),

    #[error("Cannot write to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecorderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

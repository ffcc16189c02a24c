//! Error taxonomy
//!
//! Device and persistence failures are fatal for a session. Engine failures are
//! recovered by the controller and turned into an outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Frame source errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No frame source could be opened
    #[error("no frame source available: {0}")]
    DeviceUnavailable(String),
    /// The source stopped delivering frames
    #[error("frame read failed: {0}")]
    FrameRead(String),
    #[error("failed to decode frame: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Detection engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine raised while recognizing
    #[error("engine failed: {0}")]
    Failed(String),
    /// The engine returned data that cannot be merged
    #[error("engine returned malformed data: {0}")]
    Malformed(String),
}

/// Result sink / image persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Fatal session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistError),
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        SessionError::DeviceUnavailable(err.to_string())
    }
}

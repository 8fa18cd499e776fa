//! Error types for sonoscene

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SonoSceneError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index {index} out of range (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Audio loading error: {0}")]
    AudioLoading(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("WAV encoding error: {0}")]
    Wav(hound::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Transform error: {0}")]
    Transform(String),
}

impl From<hound::Error> for SonoSceneError {
    fn from(err: hound::Error) -> Self {
        // Unwritable paths surface as plain IO errors, not codec errors.
        match err {
            hound::Error::IoError(io) => Self::Io(io),
            other => Self::Wav(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SonoSceneError>;

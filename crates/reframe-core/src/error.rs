//! Error types for reframe

use crate::config::FourCc;
use crate::frame::Shape;
use thiserror::Error;

/// Main error type for reframe operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resampling {old_length} frames to {new_length} gives a step of zero")]
    ZeroStep { old_length: usize, new_length: usize },

    #[error("Frame {index} has shape {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: Shape,
        found: Shape,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Video decoding error: {0}")]
    Decode(String),

    #[error("Video encoding error: {0}")]
    Encoder(String),

    #[error("No encoder available for codec tag '{0}'")]
    UnsupportedCodec(FourCc),

    #[error("Output slot {index} was never filled")]
    IncompleteBuffer { index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using reframe's Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a dimension mismatch error
    pub fn mismatch(index: usize, expected: Shape, found: Shape) -> Self {
        Error::DimensionMismatch {
            index,
            expected,
            found,
        }
    }

    /// Attribute a dimension mismatch to sequence position `index`
    ///
    /// Other variants are returned unchanged.
    pub fn at_index(self, index: usize) -> Self {
        match self {
            Error::DimensionMismatch {
                expected, found, ..
            } => Error::mismatch(index, expected, found),
            other => other,
        }
    }
}

//! Error types shared by every part of the decode pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// A pipeline was requested with an empty encoding chain.
    #[error("mojibake: at least one encoding is required")]
    NoEncodings,

    /// A stage was asked to finish while it still held an incomplete sequence.
    #[error("mojibake: {stage}: malformed byte stream")]
    Malformed { stage: String },

    /// The pipeline has already been closed.
    #[error("mojibake: pipeline is closed")]
    Closed,

    /// A stage task went away before acknowledging a request.
    #[error("mojibake: {stage}: stage task is gone")]
    Disconnected { stage: String },

    #[error("mojibake: unknown encoding {0:?}")]
    UnknownEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoded bytes were requested as text but are not valid UTF-8.
    #[error("mojibake: decoded output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl DecodeError {
    pub(crate) fn malformed(stage: &str) -> Self {
        Self::Malformed {
            stage: stage.to_string(),
        }
    }

    pub(crate) fn disconnected(stage: &str) -> Self {
        Self::Disconnected {
            stage: stage.to_string(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

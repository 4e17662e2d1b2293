//! Error types for audio resampling and rebuffering.

use avpump_core::{ChannelLayout, SampleFormat};
use thiserror::Error;

/// Result type for resampling operations.
pub type Result<T> = std::result::Result<T, ResampleError>;

/// Errors that can occur during resampling.
#[derive(Debug, Error)]
pub enum ResampleError {
    /// Invalid sample rate specified.
    #[error("Invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: u32 },

    /// Invalid channel count.
    #[error("Invalid channel count: {count} (must be > 0)")]
    InvalidChannelCount { count: usize },

    /// Invalid destination frame size.
    #[error("Invalid frame size: {size} samples (must be > 0)")]
    InvalidFrameSize { size: usize },

    /// A source frame does not match the parameters the context was initialized with.
    #[error(
        "Source parameters changed from {expected_format}/{expected_layout}/{expected_rate}Hz \
         to {format}/{layout}/{rate}Hz"
    )]
    SourceChanged {
        expected_format: SampleFormat,
        expected_layout: ChannelLayout,
        expected_rate: u32,
        format: SampleFormat,
        layout: ChannelLayout,
        rate: u32,
    },

    /// Input buffer layout does not match the FIFO or context.
    #[error("Buffer mismatch: expected {expected}, got {actual}")]
    BufferMismatch { expected: String, actual: String },

    /// A frame without audio samples was passed where audio is required.
    #[error("Frame does not carry audio samples")]
    NotAudio,

    /// Fewer samples are buffered than requested.
    #[error("Insufficient samples: need {needed}, have {available}")]
    InsufficientSamples { needed: usize, available: usize },

    /// Internal processing error.
    #[error("Internal resampling error: {message}")]
    Internal { message: String },
}

impl ResampleError {
    /// Create an internal error with a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a buffer mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::BufferMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<ResampleError> for avpump_core::Error {
    fn from(err: ResampleError) -> Self {
        match err {
            ResampleError::InvalidSampleRate { .. }
            | ResampleError::InvalidChannelCount { .. }
            | ResampleError::InvalidFrameSize { .. }
            | ResampleError::SourceChanged { .. } => {
                avpump_core::Error::InvalidConfiguration(err.to_string())
            }
            ResampleError::BufferMismatch { .. }
            | ResampleError::NotAudio
            | ResampleError::InsufficientSamples { .. } => {
                avpump_core::Error::InvalidParameter(err.to_string())
            }
            ResampleError::Internal { .. } => avpump_core::Error::Resource(err.to_string()),
        }
    }
}

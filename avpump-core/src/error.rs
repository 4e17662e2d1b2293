//! Error types for avpump.
//!
//! Configuration and capability problems are detected before the codec engine
//! is touched. Engine status codes other than "needs input" and "end of stream"
//! surface as [`Error::Protocol`].

use thiserror::Error;

/// Main error type for avpump.
#[derive(Error, Debug)]
pub enum Error {
    /// Codec lookup, open or pump errors.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Non-positive sizes/rates/dimensions, or a format the codec cannot take.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Requested format, rate or layout is outside the codec's supported set.
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Operation invoked on a session or context that is not open.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// The engine returned an unexpected status from submit/receive.
    #[error("Protocol error ({code}): {message}")]
    Protocol { code: i32, message: String },

    /// Allocation failure inside the engine.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Invalid argument passed by the caller.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Codec errors.
#[derive(Error, Debug)]
pub enum CodecError {
    /// No codec registered under the requested identifier.
    #[error("Codec not found: {0}")]
    NotFound(String),

    /// The engine refused to open the codec.
    #[error("Failed to open codec {codec}: {message}")]
    OpenFailed { codec: String, message: String },

    /// The pump hit a fatal status earlier and cannot be reused.
    #[error("Pump failed on a previous call and must be reopened")]
    PumpFailed,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    /// Create an unsupported capability error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedCapability(msg.into())
    }

    /// Create a not-initialized error.
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Error::NotInitialized(msg.into())
    }

    /// Create a protocol error from a native status code.
    pub fn protocol(code: i32, message: impl Into<String>) -> Self {
        Error::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Create a resource error.
    pub fn resource(msg: impl Into<String>) -> Self {
        Error::Resource(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Check if this error was raised before reaching the engine.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfiguration(_) | Error::UnsupportedCapability(_)
        )
    }

    /// Native status code, for protocol errors.
    #[must_use]
    pub fn native_code(&self) -> Option<i32> {
        match self {
            Error::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }
}

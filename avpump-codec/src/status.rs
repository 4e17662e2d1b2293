//! Engine status codes.
//!
//! Engines report the outcome of every send and receive as a [`Status`].
//! Native integer codes are mapped with [`Status::from_code`]: non-negative
//! codes succeed, two negative codes are flow control, everything else is an
//! error carrying the native code.

use thiserror::Error;

/// "Try again": output must be drained or more input supplied.
pub const AGAIN: i32 = -11;
/// Out of memory.
pub const NO_MEMORY: i32 = -12;
/// Invalid argument.
pub const INVALID_ARGUMENT: i32 = -22;
/// End of stream reached.
pub const END_OF_STREAM: i32 = -541_478_725;
/// Invalid data found when processing input.
pub const INVALID_DATA: i32 = -1_094_995_529;

/// A native engine error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine error {code}: {message}")]
pub struct NativeError {
    /// The native error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl NativeError {
    /// Create an error with an explicit message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an error with the standard description for `code`.
    pub fn from_code(code: i32) -> Self {
        Self::new(code, describe(code))
    }
}

impl From<NativeError> for avpump_core::Error {
    fn from(err: NativeError) -> Self {
        avpump_core::Error::protocol(err.code, err.message)
    }
}

/// Outcome of a single send or receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The call succeeded.
    Ok,
    /// No output available until more input is sent.
    NeedsInput,
    /// The engine has been fully drained.
    EndOfStream,
    /// Anything else. Fatal for the pump.
    Error(NativeError),
}

impl Status {
    /// Map a native return code.
    pub fn from_code(code: i32) -> Self {
        match code {
            c if c >= 0 => Status::Ok,
            AGAIN => Status::NeedsInput,
            END_OF_STREAM => Status::EndOfStream,
            code => Status::Error(NativeError::from_code(code)),
        }
    }

    /// Shorthand for an error status with the standard description.
    pub fn error(code: i32) -> Self {
        Status::Error(NativeError::from_code(code))
    }

    /// Whether this is [`Status::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Whether this is a flow-control status that ends a drain normally.
    pub fn is_flow_control(&self) -> bool {
        matches!(self, Status::NeedsInput | Status::EndOfStream)
    }
}

fn describe(code: i32) -> String {
    match code {
        AGAIN => "Resource temporarily unavailable".into(),
        NO_MEMORY => "Cannot allocate memory".into(),
        INVALID_ARGUMENT => "Invalid argument".into(),
        END_OF_STREAM => "End of file".into(),
        INVALID_DATA => "Invalid data found when processing input".into(),
        other => format!("Unknown error {other}"),
    }
}

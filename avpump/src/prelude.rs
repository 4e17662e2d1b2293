//! Prelude module for convenient imports.
//!
//! ```rust
//! use avpump::prelude::*;
//! ```

// Core error types
pub use crate::{Error, Result};

// Frame, packet and sample types
pub use crate::{ChannelLayout, Frame, Packet, SampleBuffer, SampleFormat};

// Timestamp types
pub use crate::{Duration, TimeBase, Timestamp};

// Rebuffering
pub use crate::AudioRebuffer;

// Codec engine and pumps
pub use crate::{CodecConfig, CodecEngine, Decoder, Encoder, SoftwareEngine};

// High-level API
pub use crate::{AudioEncodeOptions, AudioEncodePipeline};

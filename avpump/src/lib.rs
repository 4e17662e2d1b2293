//! # avpump
//!
//! Audio rebuffering and codec drain pumps over a pluggable codec engine.
//!
//! Decoded audio rarely arrives in the frame size, sample format or rate an
//! encoder wants. This crate connects the pieces that fix that:
//!
//! - [`AudioRebuffer`] converts source audio and hands out fixed-size frames
//! - [`Encoder`] / [`Decoder`] drive an engine through the send/receive
//!   protocol, yielding every unit the engine has ready
//! - [`AudioEncodePipeline`] chains the two
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use avpump::{AudioEncodeOptions, AudioEncodePipeline, SoftwareEngine};
//!
//! fn main() -> avpump::Result<()> {
//!     let options = AudioEncodeOptions::new()
//!         .codec("pcm_s16le")
//!         .sample_rate(48000);
//!
//!     let engine = SoftwareEngine::new();
//!     let mut pipeline = AudioEncodePipeline::new(&engine, options)?;
//!
//!     # let decoded: Vec<avpump::Frame> = Vec::new();
//!     for frame in &decoded {
//!         for packet in pipeline.push(frame)? {
//!             println!("packet of {} bytes", packet.size());
//!         }
//!     }
//!     let tail = pipeline.finish()?;
//!     println!("{} final packets", tail.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - `avpump-core`: frames, packets, sample buffers, timestamps, errors
//! - `avpump-resample`: sample FIFO, resample context and rebuffer
//! - `avpump-codec`: engine boundary, codec sessions and the drain pump

mod options;
mod pipeline;
pub mod prelude;

// Re-export core types
pub use avpump_core::{
    error::{CodecError, Error, Result},
    frame::{Frame, FrameBuffer, FrameData, FrameFlags, PixelFormat},
    packet::{Packet, PacketFlags, SideData, SideDataType},
    sample::{ChannelLayout, SampleBuffer, SampleFormat},
    timestamp::{Duration, TimeBase, Timestamp},
};

// Re-export resample types
pub use avpump_resample::{
    AudioFifo, AudioRebuffer, Converted, ConvertedFrame, ResampleBackend, ResampleContext,
    ResampleError, ResampleParams,
};

// Re-export codec types
pub use avpump_codec::{
    CodecCapabilities, CodecConfig, CodecDescriptor, CodecEngine, CodecId, CodecSession, Decoder,
    Drain, DrainPump, Encoder, MediaType, NativeError, PumpState, SessionBackend, SoftwareEngine,
    Status,
};

// High-level API
pub use options::{AudioEncodeOptions, DEFAULT_FRAME_SIZE};
pub use pipeline::{AudioEncodePipeline, PipelineStats};

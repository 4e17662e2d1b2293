//! # avpump Resample
//!
//! Audio sample conversion and fixed-size rebuffering.
//!
//! Encoders with a fixed frame size (AAC wants 1024 samples, MP2 1152) cannot
//! accept decoded audio as it arrives. This crate provides:
//!
//! - [`AudioFifo`]: a multi-plane sample ring buffer that grows on demand
//! - [`ResampleContext`]: format, layout and rate conversion in one step
//! - [`AudioRebuffer`]: a context plus a FIFO, handing out frames of exactly
//!   the requested size in the destination format
//!
//! ## Example
//!
//! ```ignore
//! use avpump_core::{ChannelLayout, SampleFormat};
//! use avpump_resample::AudioRebuffer;
//!
//! let mut rebuffer = AudioRebuffer::new(SampleFormat::F32p, ChannelLayout::Stereo, 1024, 48000)?;
//! let frames = rebuffer.convert(Some(&decoded))?.collect_owned()?;
//! ```

pub mod context;
pub mod error;
pub mod fifo;
pub mod linear;
pub mod pcm;
pub mod rebuffer;

pub use context::{ConvertInput, ResampleBackend, ResampleContext, ResampleParams};
pub use error::{ResampleError, Result};
pub use fifo::AudioFifo;
pub use linear::LinearResampler;
pub use rebuffer::{AudioRebuffer, BackendFactory, Converted, ConvertedFrame};

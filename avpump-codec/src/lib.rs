//! # avpump Codecs
//!
//! Codec sessions and the send/receive drain pump.
//!
//! ## Engine Boundary
//!
//! A [`CodecEngine`] looks up codecs and opens [`SessionBackend`]s. Backends
//! speak a status-based protocol: each send or receive reports a [`Status`],
//! where [`Status::NeedsInput`] and [`Status::EndOfStream`] are flow control
//! and anything else is an engine error.
//!
//! ## Drain Pump
//!
//! - [`CodecSession`] - validated, owned engine session, closed exactly once
//! - [`DrainPump`] ([`Encoder`] / [`Decoder`]) - submits one unit and returns
//!   a [`Drain`] over the outputs it produced
//!
//! ## Software Engine
//!
//! [`SoftwareEngine`] provides `pcm_s16le` and `pcm_f32le` encoders and
//! decoders, with an optional output delay.

pub mod codec;
pub mod config;
pub mod engine;
pub mod pump;
pub mod session;
pub mod software;
pub mod status;

pub use codec::{CodecCapabilities, CodecDescriptor, CodecId, Direction, MediaType};
pub use config::{AudioParams, CodecConfig, VideoParams};
pub use engine::{CodecEngine, DecoderBackend, EncoderBackend, SessionBackend};
pub use pump::{Decoder, Drain, DrainPump, Encoder, PumpState};
pub use session::{CodecSession, DecoderSession, EncoderSession};
pub use software::SoftwareEngine;
pub use status::{NativeError, Status};

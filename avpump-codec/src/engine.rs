//! The boundary to a codec engine.
//!
//! An engine looks up codecs and opens sessions. A session backend follows a
//! send/receive protocol: one [`send`](SessionBackend::send) may make zero or
//! more outputs available, each fetched by one [`receive`](SessionBackend::receive).
//! Sending `None` signals end of stream, after which receive eventually
//! reports [`Status::EndOfStream`].

use crate::codec::{CodecDescriptor, CodecId};
use crate::config::CodecConfig;
use crate::status::Status;
use avpump_core::{Frame, Packet, Result};

/// One open encoder or decoder inside an engine.
pub trait SessionBackend: Send {
    /// Unit submitted to the engine.
    type Input;
    /// Unit received from the engine.
    type Output;

    /// Submit one input unit, or `None` to start draining.
    fn send(&mut self, input: Option<&Self::Input>) -> Status;

    /// Write the next available output into `output`.
    ///
    /// `output` is overwritten only when [`Status::Ok`] is returned.
    fn receive(&mut self, output: &mut Self::Output) -> Status;

    /// Samples per frame the codec requires, or 0 if any size is accepted.
    fn frame_size(&self) -> usize {
        0
    }

    /// Release engine resources. Called exactly once.
    fn close(&mut self);
}

/// Backend of an encoding session.
pub type EncoderBackend = dyn SessionBackend<Input = Frame, Output = Packet>;

/// Backend of a decoding session.
pub type DecoderBackend = dyn SessionBackend<Input = Packet, Output = Frame>;

/// A codec engine.
pub trait CodecEngine {
    /// Look up an encoder.
    fn find_encoder(&self, id: &CodecId) -> Result<CodecDescriptor>;

    /// Look up a decoder.
    fn find_decoder(&self, id: &CodecId) -> Result<CodecDescriptor>;

    /// Open an encoder. `config` has already been validated.
    fn open_encoder(
        &self,
        descriptor: &CodecDescriptor,
        config: &CodecConfig,
    ) -> Result<Box<EncoderBackend>>;

    /// Open a decoder. `config` has already been validated.
    fn open_decoder(
        &self,
        descriptor: &CodecDescriptor,
        config: &CodecConfig,
    ) -> Result<Box<DecoderBackend>>;
}

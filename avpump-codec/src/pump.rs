//! The send/receive drain pump.
//!
//! A [`DrainPump`] turns one submitted input unit into however many output
//! units the engine has ready. Submitting returns a [`Drain`], a pull cursor
//! that performs exactly one receive per [`Drain::next_unit`] call:
//!
//! ```ignore
//! let mut encoder = Encoder::open(&engine, &"pcm_s16le".into(), config)?;
//!
//! for frame in &mut frames {
//!     let mut packets = encoder.encode(frame)?;
//!     while let Some(packet) = packets.next_unit()? {
//!         muxer.write(packet)?;
//!     }
//! }
//!
//! let mut packets = encoder.flush()?;
//! while let Some(packet) = packets.next_unit()? {
//!     muxer.write(packet)?;
//! }
//! ```
//!
//! Every yielded unit is the pump's reusable scratch unit, borrowed until the
//! next pull. Use [`Drain::collect_owned`] or clone a unit to keep it.
//!
//! Flow-control statuses end a drain normally. Any engine error is fatal: it
//! is raised as [`Error::Protocol`] and the pump moves to
//! [`PumpState::Failed`], after which every call fails with
//! [`CodecError::PumpFailed`].

use crate::codec::CodecId;
use crate::config::CodecConfig;
use crate::engine::{CodecEngine, DecoderBackend, EncoderBackend, SessionBackend};
use crate::session::CodecSession;
use crate::status::Status;
use avpump_core::{CodecError, Error, Frame, Packet, Result, SideDataType};
use tracing::{trace, warn};

/// Lifecycle of a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// Ready to accept input.
    Ready,
    /// A [`Drain`] is outstanding.
    Draining,
    /// An engine error occurred. Terminal.
    Failed,
}

/// Drives a codec session through the send/receive protocol.
pub struct DrainPump<B: SessionBackend + ?Sized> {
    session: CodecSession<B>,
    scratch: B::Output,
    state: PumpState,
}

/// Frames in, packets out.
pub type Encoder = DrainPump<EncoderBackend>;

/// Packets in, frames out.
pub type Decoder = DrainPump<DecoderBackend>;

impl<B> DrainPump<B>
where
    B: SessionBackend + ?Sized,
    B::Output: Default,
{
    /// Create a pump over an open session.
    pub fn new(session: CodecSession<B>) -> Self {
        Self {
            session,
            scratch: B::Output::default(),
            state: PumpState::Ready,
        }
    }
}

impl<B: SessionBackend + ?Sized> DrainPump<B> {
    /// Current state.
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// The underlying session.
    pub fn session(&self) -> &CodecSession<B> {
        &self.session
    }

    /// Samples per frame the codec requires, or 0 for any size.
    pub fn frame_size(&self) -> usize {
        self.session.frame_size()
    }

    /// Signal end of stream and drain everything the engine still holds.
    pub fn flush(&mut self) -> Result<Drain<'_, B>> {
        self.submit(None)
    }

    /// Close the session. Later calls fail with [`Error::NotInitialized`].
    pub fn close(&mut self) {
        self.session.close();
    }

    fn submit(&mut self, input: Option<&B::Input>) -> Result<Drain<'_, B>> {
        if self.state == PumpState::Failed {
            return Err(CodecError::PumpFailed.into());
        }

        let status = self.session.backend_mut()?.send(input);
        if let Status::Error(err) = status {
            self.state = PumpState::Failed;
            warn!(
                codec = %self.session.descriptor().id,
                code = err.code,
                "send failed: {}",
                err.message
            );
            return Err(err.into());
        }
        trace!(
            codec = %self.session.descriptor().id,
            eof = input.is_none(),
            flow_control = status.is_flow_control(),
            "submitted"
        );

        self.state = PumpState::Draining;
        Ok(Drain {
            pump: self,
            finished: false,
        })
    }
}

impl DrainPump<EncoderBackend> {
    /// Look up and open an encoder.
    pub fn open(engine: &dyn CodecEngine, id: &CodecId, config: CodecConfig) -> Result<Self> {
        let descriptor = engine.find_encoder(id)?;
        Ok(Self::new(CodecSession::open_encoder(engine, descriptor, config)?))
    }

    /// Submit a frame and drain the packets it makes available.
    ///
    /// A53 closed captions are stripped from video frames before submission.
    pub fn encode(&mut self, frame: &mut Frame) -> Result<Drain<'_, EncoderBackend>> {
        if frame.is_video() {
            let stripped = frame.remove_side_data(SideDataType::A53ClosedCaptions);
            if stripped > 0 {
                trace!(stripped, "removed A53 captions before encoding");
            }
        }
        self.submit(Some(&*frame))
    }

    /// Submit an audio frame without taking it mutably.
    pub fn encode_audio(&mut self, frame: &Frame) -> Result<Drain<'_, EncoderBackend>> {
        if !frame.is_audio() {
            return Err(Error::invalid_param("encode_audio expects an audio frame"));
        }
        self.submit(Some(frame))
    }

    /// Encode every frame, flush, and return owned copies of all packets.
    pub fn encode_all<'f, I>(&mut self, frames: I) -> Result<Vec<Packet>>
    where
        I: IntoIterator<Item = &'f mut Frame>,
    {
        let mut packets = Vec::new();
        for frame in frames {
            self.encode(frame)?.for_each(|p| packets.push(p.clone()))?;
        }
        self.flush()?.for_each(|p| packets.push(p.clone()))?;
        Ok(packets)
    }
}

impl DrainPump<DecoderBackend> {
    /// Look up and open a decoder.
    pub fn open(engine: &dyn CodecEngine, id: &CodecId, config: CodecConfig) -> Result<Self> {
        let descriptor = engine.find_decoder(id)?;
        Ok(Self::new(CodecSession::open_decoder(engine, descriptor, config)?))
    }

    /// Submit a packet and drain the frames it makes available.
    pub fn decode(&mut self, packet: &Packet) -> Result<Drain<'_, DecoderBackend>> {
        self.submit(Some(packet))
    }

    /// Decode every packet, flush, and return owned copies of all frames.
    pub fn decode_all<'p, I>(&mut self, packets: I) -> Result<Vec<Frame>>
    where
        I: IntoIterator<Item = &'p Packet>,
    {
        let mut frames = Vec::new();
        for packet in packets {
            self.decode(packet)?.for_each(|f| frames.push(f.clone()))?;
        }
        self.flush()?.for_each(|f| frames.push(f.clone()))?;
        Ok(frames)
    }
}

impl<B: SessionBackend + ?Sized> std::fmt::Debug for DrainPump<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainPump")
            .field("session", &self.session)
            .field("state", &self.state)
            .finish()
    }
}

/// Pull cursor over the outputs of one submission.
///
/// Dropping a drain early returns the pump to [`PumpState::Ready`]; outputs
/// not yet received stay in the engine and come out of the next drain.
pub struct Drain<'a, B: SessionBackend + ?Sized> {
    pump: &'a mut DrainPump<B>,
    finished: bool,
}

impl<'a, B: SessionBackend + ?Sized> Drain<'a, B> {
    /// Receive the next output unit.
    ///
    /// Returns `Ok(None)` once the engine needs more input or is fully
    /// drained, and on every call after that.
    pub fn next_unit(&mut self) -> Result<Option<&B::Output>> {
        if self.finished {
            return Ok(None);
        }

        let pump = &mut *self.pump;
        let backend = match pump.session.backend_mut() {
            Ok(backend) => backend,
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };

        match backend.receive(&mut pump.scratch) {
            Status::Ok => Ok(Some(&pump.scratch)),
            Status::NeedsInput | Status::EndOfStream => {
                self.finished = true;
                Ok(None)
            }
            Status::Error(err) => {
                self.finished = true;
                pump.state = PumpState::Failed;
                warn!(
                    codec = %pump.session.descriptor().id,
                    code = err.code,
                    "receive failed: {}",
                    err.message
                );
                Err(err.into())
            }
        }
    }

    /// Run `f` on every remaining unit and return how many there were.
    pub fn for_each<F>(mut self, mut f: F) -> Result<usize>
    where
        F: FnMut(&B::Output),
    {
        let mut count = 0;
        while let Some(unit) = self.next_unit()? {
            f(unit);
            count += 1;
        }
        Ok(count)
    }

    /// Clone every remaining unit into a vector.
    pub fn collect_owned(self) -> Result<Vec<B::Output>>
    where
        B::Output: Clone,
    {
        let mut units = Vec::new();
        self.for_each(|unit| units.push(unit.clone()))?;
        Ok(units)
    }
}

impl<B: SessionBackend + ?Sized> std::fmt::Debug for Drain<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drain")
            .field("codec", &self.pump.session.descriptor().id)
            .field("state", &self.pump.state)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<B: SessionBackend + ?Sized> Drop for Drain<'_, B> {
    fn drop(&mut self) {
        if self.pump.state == PumpState::Draining {
            self.pump.state = PumpState::Ready;
        }
    }
}

//! Built-in software engine with PCM codecs.
//!
//! PCM needs no codec state, which makes it a convenient engine for wiring
//! up pipelines and exercising the drain protocol. A configurable reorder
//! delay holds back output so that drains span several submissions, the
//! way real encoders with look-ahead behave.

use crate::codec::{CodecCapabilities, CodecDescriptor, CodecId, Direction, MediaType};
use crate::config::CodecConfig;
use crate::engine::{CodecEngine, DecoderBackend, EncoderBackend, SessionBackend};
use crate::status::{self, NativeError, Status};
use avpump_core::{
    ChannelLayout, CodecError, Error, Frame, Packet, Result, SampleBuffer, SampleFormat,
    TimeBase, Timestamp,
};
use std::collections::VecDeque;
use tracing::debug;

/// Registered PCM codecs and their sample formats.
const PCM_CODECS: &[(&str, &str, SampleFormat)] = &[
    ("pcm_s16le", "PCM signed 16-bit little-endian", SampleFormat::S16),
    ("pcm_f32le", "PCM 32-bit floating point little-endian", SampleFormat::F32),
];

/// Software codec engine.
#[derive(Debug, Clone, Default)]
pub struct SoftwareEngine {
    delay: usize,
    frame_size: usize,
}

impl SoftwareEngine {
    /// Create an engine whose codecs emit output immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold back `packets` outputs until more input or end of stream arrives.
    #[must_use]
    pub fn with_delay(mut self, packets: usize) -> Self {
        self.delay = packets;
        self
    }

    /// Make encoders require exactly `samples` samples per frame.
    #[must_use]
    pub fn with_frame_size(mut self, samples: usize) -> Self {
        self.frame_size = samples;
        self
    }

    fn lookup(
        &self,
        id: &CodecId,
        direction: Direction,
    ) -> Result<(CodecDescriptor, SampleFormat)> {
        let (name, long_name, format) = PCM_CODECS
            .iter()
            .find(|(name, _, _)| *name == id.as_str())
            .ok_or_else(|| CodecError::NotFound(id.to_string()))?;

        let capabilities = CodecCapabilities::any().with_sample_formats([*format]);
        let descriptor = CodecDescriptor::new(*name, *long_name, MediaType::Audio, direction)
            .with_capabilities(capabilities);
        Ok((descriptor, *format))
    }

    fn state(&self, descriptor: &CodecDescriptor, config: &CodecConfig) -> Result<PcmState> {
        let (_, format) = self.lookup(&descriptor.id, descriptor.direction)?;
        let audio = config.audio.ok_or_else(|| CodecError::OpenFailed {
            codec: descriptor.id.to_string(),
            message: "missing audio parameters".into(),
        })?;
        if audio.sample_format != format {
            return Err(Error::unsupported(format!(
                "{} requires {format}, got {}",
                descriptor.id, audio.sample_format
            )));
        }

        debug!(codec = %descriptor.id, delay = self.delay, "opening software codec");
        Ok(PcmState {
            format,
            layout: audio.channel_layout,
            sample_rate: audio.sample_rate,
            time_base: config.time_base,
            delay: self.delay,
            draining: false,
        })
    }
}

impl CodecEngine for SoftwareEngine {
    fn find_encoder(&self, id: &CodecId) -> Result<CodecDescriptor> {
        Ok(self.lookup(id, Direction::Encode)?.0)
    }

    fn find_decoder(&self, id: &CodecId) -> Result<CodecDescriptor> {
        Ok(self.lookup(id, Direction::Decode)?.0)
    }

    fn open_encoder(
        &self,
        descriptor: &CodecDescriptor,
        config: &CodecConfig,
    ) -> Result<Box<EncoderBackend>> {
        Ok(Box::new(PcmEncoder {
            state: self.state(descriptor, config)?,
            frame_size: self.frame_size,
            queue: VecDeque::new(),
        }))
    }

    fn open_decoder(
        &self,
        descriptor: &CodecDescriptor,
        config: &CodecConfig,
    ) -> Result<Box<DecoderBackend>> {
        Ok(Box::new(PcmDecoder {
            state: self.state(descriptor, config)?,
            queue: VecDeque::new(),
        }))
    }
}

#[derive(Debug)]
struct PcmState {
    format: SampleFormat,
    layout: ChannelLayout,
    sample_rate: u32,
    time_base: TimeBase,
    delay: usize,
    draining: bool,
}

impl PcmState {
    /// Whether the next queued unit may be released.
    fn ready(&self, queued: usize) -> bool {
        queued > self.delay || (self.draining && queued > 0)
    }

    fn finish_receive(&self) -> Status {
        if self.draining {
            Status::EndOfStream
        } else {
            Status::NeedsInput
        }
    }
}

struct PcmEncoder {
    state: PcmState,
    frame_size: usize,
    queue: VecDeque<Packet>,
}

impl PcmEncoder {
    fn encode(&self, frame: &Frame) -> std::result::Result<Packet, NativeError> {
        let buffer = frame
            .samples()
            .ok_or_else(|| NativeError::new(status::INVALID_ARGUMENT, "not an audio frame"))?;
        if buffer.format != self.state.format
            || buffer.layout != self.state.layout
            || buffer.sample_rate != self.state.sample_rate
        {
            return Err(NativeError::new(
                status::INVALID_ARGUMENT,
                "frame parameters differ from the codec configuration",
            ));
        }
        if self.frame_size > 0 && buffer.num_samples() != self.frame_size {
            return Err(NativeError::new(
                status::INVALID_ARGUMENT,
                format!(
                    "frame has {} samples, codec requires {}",
                    buffer.num_samples(),
                    self.frame_size
                ),
            ));
        }

        let mut data = buffer.data()[..buffer.num_samples() * buffer.slot_size()].to_vec();
        swap_little_endian(&mut data, self.state.format.bytes_per_sample());

        let mut packet = Packet::new(data);
        packet.pts = frame.pts.rescale(self.state.time_base);
        packet.dts = packet.pts;
        packet.duration = frame.duration.rescale(self.state.time_base);
        packet.set_keyframe(true);
        Ok(packet)
    }
}

impl SessionBackend for PcmEncoder {
    type Input = Frame;
    type Output = Packet;

    fn send(&mut self, input: Option<&Frame>) -> Status {
        if self.state.draining {
            return Status::EndOfStream;
        }
        match input {
            Some(frame) => match self.encode(frame) {
                Ok(packet) => {
                    self.queue.push_back(packet);
                    Status::Ok
                }
                Err(err) => Status::Error(err),
            },
            None => {
                self.state.draining = true;
                Status::Ok
            }
        }
    }

    fn receive(&mut self, output: &mut Packet) -> Status {
        if !self.state.ready(self.queue.len()) {
            return self.state.finish_receive();
        }
        match self.queue.pop_front() {
            Some(packet) => {
                *output = packet;
                Status::Ok
            }
            None => self.state.finish_receive(),
        }
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn close(&mut self) {
        self.queue.clear();
    }
}

struct PcmDecoder {
    state: PcmState,
    queue: VecDeque<Frame>,
}

impl PcmDecoder {
    fn decode(&self, packet: &Packet) -> std::result::Result<Frame, NativeError> {
        let slot = self.state.format.slot_size(self.state.layout.channels() as usize);
        if packet.size() % slot != 0 {
            return Err(NativeError::from_code(status::INVALID_DATA));
        }

        let num_samples = packet.size() / slot;
        let mut buffer = SampleBuffer::new(
            num_samples,
            self.state.format,
            self.state.layout,
            self.state.sample_rate,
        );
        let data = buffer.data_mut();
        data.copy_from_slice(packet.data());
        swap_little_endian(data, self.state.format.bytes_per_sample());

        let mut frame = Frame::audio(buffer);
        frame.pts = if packet.pts.is_valid() {
            packet.pts.rescale(TimeBase::for_sample_rate(self.state.sample_rate))
        } else {
            Timestamp::none()
        };
        Ok(frame)
    }
}

impl SessionBackend for PcmDecoder {
    type Input = Packet;
    type Output = Frame;

    fn send(&mut self, input: Option<&Packet>) -> Status {
        if self.state.draining {
            return Status::EndOfStream;
        }
        match input {
            Some(packet) if packet.is_empty() => Status::Ok,
            Some(packet) => match self.decode(packet) {
                Ok(frame) => {
                    self.queue.push_back(frame);
                    Status::Ok
                }
                Err(err) => Status::Error(err),
            },
            None => {
                self.state.draining = true;
                Status::Ok
            }
        }
    }

    fn receive(&mut self, output: &mut Frame) -> Status {
        if !self.state.ready(self.queue.len()) {
            return self.state.finish_receive();
        }
        match self.queue.pop_front() {
            Some(frame) => {
                *output = frame;
                Status::Ok
            }
            None => self.state.finish_receive(),
        }
    }

    fn close(&mut self) {
        self.queue.clear();
    }
}

/// Convert between native and little-endian sample order, in place.
fn swap_little_endian(data: &mut [u8], width: usize) {
    if cfg!(target_endian = "big") {
        for sample in data.chunks_exact_mut(width) {
            sample.reverse();
        }
    }
}

//! Rebuffer-to-encoder pipeline.

use crate::options::AudioEncodeOptions;
use avpump_codec::{CodecEngine, Encoder};
use avpump_core::{Duration, Error, Frame, Packet, Result, TimeBase};
use avpump_resample::AudioRebuffer;
use tracing::{debug, info};

/// Counters for a running pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Source frames pushed.
    pub frames_in: u64,
    /// Source samples pushed.
    pub samples_in: u64,
    /// Frames submitted to the encoder.
    pub frames_encoded: u64,
    /// Samples submitted to the encoder, including padding.
    pub samples_encoded: u64,
    /// Packets produced.
    pub packets_out: u64,
}

/// Feeds arbitrary source audio through an [`AudioRebuffer`] into an encoder.
///
/// Frames reaching the encoder always match the encoder's configured format,
/// layout and rate, and hold exactly the codec's frame size. The final
/// partial frame is padded with silence for codecs with a fixed frame size
/// and submitted as is otherwise.
pub struct AudioEncodePipeline {
    rebuffer: AudioRebuffer,
    encoder: Encoder,
    frame_size: usize,
    pad_final: bool,
    stats: PipelineStats,
    finished: bool,
}

impl AudioEncodePipeline {
    /// Open the encoder named in `options` and size the rebuffer to it.
    pub fn new(engine: &dyn CodecEngine, options: AudioEncodeOptions) -> Result<Self> {
        options.validate()?;
        let encoder = Encoder::open(engine, &options.codec_id(), options.codec_config())?;

        let codec_frame_size = encoder.frame_size();
        let (frame_size, pad_final) = if codec_frame_size > 0 {
            (codec_frame_size, true)
        } else {
            (options.frame_size, false)
        };

        let rebuffer = AudioRebuffer::new(
            options.sample_format,
            options.channel_layout,
            frame_size,
            options.sample_rate,
        )?;

        info!(
            codec = ?options.codec,
            format = %options.sample_format,
            layout = %options.channel_layout,
            rate = options.sample_rate,
            frame_size,
            "audio encode pipeline ready"
        );

        Ok(Self {
            rebuffer,
            encoder,
            frame_size,
            pad_final,
            stats: PipelineStats::default(),
            finished: false,
        })
    }

    /// Samples per encoded frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Counters so far.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Samples buffered between the source and the encoder.
    pub fn buffered(&self) -> usize {
        self.rebuffer.size() + self.rebuffer.delay()
    }

    /// Push one source frame and return the packets it completed.
    pub fn push(&mut self, frame: &Frame) -> Result<Vec<Packet>> {
        if self.finished {
            return Err(Error::invalid_param("pipeline already finished"));
        }
        let mut packets = Vec::new();
        let mut frames = self.rebuffer.convert(Some(frame))?;
        self.stats.frames_in += 1;
        self.stats.samples_in += frame.num_samples() as u64;

        while let Some(out) = frames.next_frame()? {
            encode(&mut self.encoder, &mut self.stats, out, &mut packets)?;
        }
        Ok(packets)
    }

    /// Flush the resampler, the partial last frame and the encoder.
    pub fn finish(&mut self) -> Result<Vec<Packet>> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.finished = true;

        let mut packets = Vec::new();
        let mut frames = self.rebuffer.flush()?;
        while let Some(out) = frames.next_frame()? {
            encode(&mut self.encoder, &mut self.stats, out, &mut packets)?;
        }

        if let Some(tail) = self.rebuffer.drain_remainder()? {
            if self.pad_final && tail.num_samples() < self.frame_size {
                debug!(
                    samples = tail.num_samples(),
                    frame_size = self.frame_size,
                    "padding final frame with silence"
                );
                let padded = pad(tail, self.frame_size);
                encode(&mut self.encoder, &mut self.stats, &padded, &mut packets)?;
            } else {
                encode(&mut self.encoder, &mut self.stats, tail, &mut packets)?;
            }
        }

        let flushed = self.encoder.flush()?.for_each(|p| packets.push(p.clone()))?;
        self.stats.packets_out += flushed as u64;

        info!(
            frames_encoded = self.stats.frames_encoded,
            packets = self.stats.packets_out,
            "audio encode pipeline finished"
        );
        Ok(packets)
    }
}

impl std::fmt::Debug for AudioEncodePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEncodePipeline")
            .field("rebuffer", &self.rebuffer)
            .field("encoder", &self.encoder)
            .field("stats", &self.stats)
            .finish()
    }
}

fn encode(
    encoder: &mut Encoder,
    stats: &mut PipelineStats,
    frame: &Frame,
    packets: &mut Vec<Packet>,
) -> Result<()> {
    let produced = encoder.encode_audio(frame)?.for_each(|p| packets.push(p.clone()))?;
    stats.frames_encoded += 1;
    stats.samples_encoded += frame.num_samples() as u64;
    stats.packets_out += produced as u64;
    Ok(())
}

/// Copy of `frame` extended to `frame_size` samples of trailing silence.
fn pad(frame: &Frame, frame_size: usize) -> Frame {
    let mut padded = frame.clone();
    if let Some(buffer) = padded.samples_mut() {
        let rate = buffer.sample_rate;
        buffer.set_num_samples(frame_size);
        padded.duration = Duration::new(frame_size as i64, TimeBase::for_sample_rate(rate));
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use avpump_core::{ChannelLayout, SampleBuffer, SampleFormat};

    #[test]
    fn test_pad_fills_silence() {
        let mut buffer = SampleBuffer::new(2, SampleFormat::S16, ChannelLayout::Mono, 8000);
        buffer.data_mut().copy_from_slice(&[1, 0, 2, 0]);
        let padded = pad(&Frame::audio(buffer), 4);

        assert_eq!(padded.num_samples(), 4);
        assert_eq!(padded.samples().unwrap().data(), &[1, 0, 2, 0, 0, 0, 0, 0]);
        assert_eq!(padded.duration.value, 4);
    }
}

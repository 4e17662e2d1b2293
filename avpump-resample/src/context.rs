//! Resample context: the conversion primitive behind the rebuffer.
//!
//! A context converts sample format, channel layout and sample rate in one
//! step. Converted samples that do not fit into the caller's output capacity
//! stay buffered inside the context and come out on later calls.

use crate::error::{ResampleError, Result};
use crate::linear::LinearResampler;
use crate::pcm;
use avpump_core::{ChannelLayout, SampleBuffer, SampleFormat};
use std::collections::VecDeque;
use tracing::debug;

/// Format, layout and rate of one side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResampleParams {
    /// Sample format.
    pub format: SampleFormat,
    /// Channel layout.
    pub layout: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl ResampleParams {
    /// Create a new parameter set.
    pub fn new(format: SampleFormat, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            format,
            layout,
            sample_rate,
        }
    }

    /// Parameters describing an existing buffer.
    pub fn of(buffer: &SampleBuffer) -> Self {
        Self::new(buffer.format, buffer.layout, buffer.sample_rate)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.layout.channels() as usize
    }

    /// Reject zero rates and channel counts.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ResampleError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        if self.channels() == 0 {
            return Err(ResampleError::InvalidChannelCount {
                count: self.channels(),
            });
        }
        Ok(())
    }
}

/// Input to a single conversion call.
#[derive(Debug, Clone, Copy)]
pub enum ConvertInput<'a> {
    /// New source samples.
    Samples(&'a SampleBuffer),
    /// No new input; return output that is already converted.
    Pending,
    /// End of stream; also release samples held for resampler look-ahead.
    Flush,
}

/// A sample conversion engine.
///
/// [`ResampleContext`] is the built-in implementation; other engines plug in
/// through [`AudioRebuffer::with_backend`](crate::AudioRebuffer::with_backend).
pub trait ResampleBackend: Send {
    /// Convert `input` and write at most `capacity` samples to the start of `dst`.
    ///
    /// Returns the number of samples written. Output that does not fit stays
    /// buffered for the next call.
    fn convert(
        &mut self,
        dst: &mut SampleBuffer,
        capacity: usize,
        input: ConvertInput<'_>,
    ) -> Result<usize>;

    /// Output samples currently buffered inside the backend, including
    /// resampler look-ahead expressed at the destination rate.
    fn delay(&self) -> usize;

    /// Drop everything buffered.
    fn reset(&mut self);
}

/// Software resample context.
///
/// Samples are decoded to `f64`, remixed to the destination channel count,
/// rate converted with [`LinearResampler`] when the rates differ, and encoded
/// into the destination format.
#[derive(Debug)]
pub struct ResampleContext {
    src: ResampleParams,
    dst: ResampleParams,
    rate: Option<LinearResampler>,
    pending: Vec<VecDeque<f64>>,
    scratch: Vec<Vec<f64>>,
}

impl ResampleContext {
    /// Initialize a context converting from `src` to `dst`.
    pub fn new(src: ResampleParams, dst: ResampleParams) -> Result<Self> {
        src.validate()?;
        dst.validate()?;

        let channels = dst.channels();
        let rate = if src.sample_rate != dst.sample_rate {
            Some(LinearResampler::new(
                src.sample_rate,
                dst.sample_rate,
                channels,
            )?)
        } else {
            None
        };

        debug!(
            src_format = %src.format,
            src_layout = %src.layout,
            src_rate = src.sample_rate,
            dst_format = %dst.format,
            dst_layout = %dst.layout,
            dst_rate = dst.sample_rate,
            "resample context initialized"
        );

        Ok(Self {
            src,
            dst,
            rate,
            pending: vec![VecDeque::new(); channels],
            scratch: vec![Vec::new(); channels],
        })
    }

    /// Source parameters.
    pub fn source(&self) -> ResampleParams {
        self.src
    }

    /// Destination parameters.
    pub fn destination(&self) -> ResampleParams {
        self.dst
    }

    fn ingest(&mut self, buffer: &SampleBuffer) -> Result<()> {
        let params = ResampleParams::of(buffer);
        if params != self.src {
            return Err(ResampleError::SourceChanged {
                expected_format: self.src.format,
                expected_layout: self.src.layout,
                expected_rate: self.src.sample_rate,
                format: params.format,
                layout: params.layout,
                rate: params.sample_rate,
            });
        }
        if buffer.num_samples() == 0 {
            return Ok(());
        }

        let remixed = remix(pcm::decode_channels(buffer), self.dst.channels());
        match &mut self.rate {
            Some(rate) => {
                rate.process(&remixed, &mut self.scratch)?;
                self.take_scratch();
            }
            None => {
                for (queue, samples) in self.pending.iter_mut().zip(remixed) {
                    queue.extend(samples);
                }
            }
        }
        Ok(())
    }

    fn flush_rate(&mut self) -> Result<()> {
        if let Some(rate) = &mut self.rate {
            rate.flush(&mut self.scratch)?;
            self.take_scratch();
        }
        Ok(())
    }

    fn take_scratch(&mut self) {
        for (queue, scratch) in self.pending.iter_mut().zip(&mut self.scratch) {
            queue.extend(scratch.drain(..));
        }
    }
}

impl ResampleBackend for ResampleContext {
    fn convert(
        &mut self,
        dst: &mut SampleBuffer,
        capacity: usize,
        input: ConvertInput<'_>,
    ) -> Result<usize> {
        if dst.format != self.dst.format || dst.channels() != self.dst.channels() {
            return Err(ResampleError::mismatch(
                format!("{}x{}", self.dst.format, self.dst.channels()),
                format!("{}x{}", dst.format, dst.channels()),
            ));
        }

        match input {
            ConvertInput::Samples(buffer) => self.ingest(buffer)?,
            ConvertInput::Pending => {}
            ConvertInput::Flush => self.flush_rate()?,
        }

        let count = capacity.min(self.pending[0].len());
        if dst.num_samples() < count {
            dst.set_num_samples(count);
        }
        let mut sources: Vec<_> = self.pending.iter_mut().map(|q| q.drain(..count)).collect();
        pcm::encode_channels(dst, &mut sources, count);
        Ok(count)
    }

    fn delay(&self) -> usize {
        let held = self.rate.as_ref().map_or(0, |rate| {
            (rate.latency() as f64 * rate.ratio()).ceil() as usize
        });
        self.pending[0].len() + held
    }

    fn reset(&mut self) {
        for queue in &mut self.pending {
            queue.clear();
        }
        if let Some(rate) = &mut self.rate {
            rate.reset();
        }
    }
}

/// Map decoded source channels onto `channels` destination channels.
///
/// Mono is duplicated into every destination channel, anything downmixed to
/// mono is averaged, other layouts keep the leading channels and fill missing
/// ones with silence.
fn remix(source: Vec<Vec<f64>>, channels: usize) -> Vec<Vec<f64>> {
    let len = source.first().map_or(0, Vec::len);
    match (source.len(), channels) {
        (s, d) if s == d => source,
        (1, d) => vec![source[0].clone(); d],
        (s, 1) => {
            let mixed = (0..len)
                .map(|i| source.iter().map(|ch| ch[i]).sum::<f64>() / s as f64)
                .collect();
            vec![mixed]
        }
        (_, d) => {
            let mut out: Vec<Vec<f64>> = source.into_iter().take(d).collect();
            out.resize(d, vec![0.0; len]);
            out
        }
    }
}

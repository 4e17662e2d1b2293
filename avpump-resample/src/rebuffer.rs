//! Fixed-size audio rebuffering.
//!
//! [`AudioRebuffer`] accepts audio frames of any length, format and rate and
//! hands out frames of exactly `dst_nb_samples` samples in the destination
//! format. Converted samples accumulate in an [`AudioFifo`] between calls.
//!
//! ```ignore
//! let mut rebuffer = AudioRebuffer::new(SampleFormat::F32p, ChannelLayout::Stereo, 1024, 48000)?;
//!
//! for source in decoded_frames {
//!     let mut frames = rebuffer.convert(Some(&source))?;
//!     while let Some(frame) = frames.next_frame()? {
//!         encoder.send(Some(frame))?;
//!     }
//! }
//!
//! // Resampler look-ahead is only released by an explicit flush.
//! let mut frames = rebuffer.flush()?;
//! while let Some(frame) = frames.next_frame()? {
//!     encoder.send(Some(frame))?;
//! }
//! ```

use crate::context::{ConvertInput, ResampleBackend, ResampleContext, ResampleParams};
use crate::error::{ResampleError, Result};
use crate::fifo::AudioFifo;
use avpump_core::{ChannelLayout, Duration, Frame, SampleBuffer, SampleFormat, TimeBase, Timestamp};
use tracing::{debug, trace};

/// Creates a backend once the source parameters are known.
pub type BackendFactory =
    Box<dyn FnMut(ResampleParams, ResampleParams) -> Result<Box<dyn ResampleBackend>> + Send>;

/// Converts arbitrary source audio into fixed-size destination frames.
pub struct AudioRebuffer {
    dst: ResampleParams,
    dst_nb_samples: usize,
    src: Option<ResampleParams>,
    backend: Option<Box<dyn ResampleBackend>>,
    factory: BackendFactory,
    fifo: AudioFifo,
    /// Receives each converted chunk before it enters the FIFO.
    chunk: SampleBuffer,
    /// The single destination frame handed to callers.
    frame: Frame,
    samples_out: u64,
}

impl AudioRebuffer {
    /// Create a rebuffer using the built-in [`ResampleContext`].
    pub fn new(
        format: SampleFormat,
        layout: ChannelLayout,
        dst_nb_samples: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        Self::with_backend(
            format,
            layout,
            dst_nb_samples,
            sample_rate,
            Box::new(|src, dst| {
                let ctx = ResampleContext::new(src, dst)?;
                Ok(Box::new(ctx) as Box<dyn ResampleBackend>)
            }),
        )
    }

    /// Create a rebuffer whose conversion backend comes from `factory`.
    ///
    /// The factory runs once, on the first pushed frame.
    pub fn with_backend(
        format: SampleFormat,
        layout: ChannelLayout,
        dst_nb_samples: usize,
        sample_rate: u32,
        factory: BackendFactory,
    ) -> Result<Self> {
        if dst_nb_samples == 0 {
            return Err(ResampleError::InvalidFrameSize {
                size: dst_nb_samples,
            });
        }
        let dst = ResampleParams::new(format, layout, sample_rate);
        dst.validate()?;

        let fifo = AudioFifo::new(format, dst.channels(), dst_nb_samples * 2)?;
        let chunk = SampleBuffer::new(dst_nb_samples, format, layout, sample_rate);
        let mut frame = Frame::new_audio(dst_nb_samples, format, layout, sample_rate);
        frame.pts = Timestamp::new(0, TimeBase::for_sample_rate(sample_rate));

        Ok(Self {
            dst,
            dst_nb_samples,
            src: None,
            backend: None,
            factory,
            fifo,
            chunk,
            frame,
            samples_out: 0,
        })
    }

    /// Samples in every frame handed out by [`pop`](Self::pop).
    pub fn dst_nb_samples(&self) -> usize {
        self.dst_nb_samples
    }

    /// Destination parameters.
    pub fn destination(&self) -> ResampleParams {
        self.dst
    }

    /// Source parameters, once the first frame has been pushed.
    pub fn source(&self) -> Option<ResampleParams> {
        self.src
    }

    /// Samples currently waiting in the FIFO.
    pub fn size(&self) -> usize {
        self.fifo.size()
    }

    /// Samples still buffered inside the conversion backend.
    pub fn delay(&self) -> usize {
        self.backend.as_ref().map_or(0, |b| b.delay())
    }

    /// Convert `src` into the FIFO and return the new FIFO size.
    ///
    /// `None` flushes the backend: samples it holds for look-ahead are
    /// converted and appended.
    pub fn push(&mut self, src: Option<&Frame>) -> Result<usize> {
        let mut input = match src {
            Some(frame) => {
                let buffer = frame.samples().ok_or(ResampleError::NotAudio)?;
                self.ensure_backend(buffer)?;
                ConvertInput::Samples(buffer)
            }
            None if self.backend.is_none() => return Ok(self.fifo.size()),
            None => ConvertInput::Flush,
        };

        let Some(backend) = self.backend.as_mut() else {
            return Err(ResampleError::internal("backend missing after initialization"));
        };

        loop {
            let produced = backend.convert(&mut self.chunk, self.dst_nb_samples, input)?;
            if produced > 0 {
                self.fifo.write(self.chunk.planes(), produced)?;
            }
            if produced < self.dst_nb_samples {
                break;
            }
            // Flush stays a flush; new samples were consumed by the first call.
            if !matches!(input, ConvertInput::Flush) {
                input = ConvertInput::Pending;
            }
        }

        trace!(fifo = self.fifo.size(), delay = backend.delay(), "pushed audio");
        Ok(self.fifo.size())
    }

    /// Move exactly `dst_nb_samples` from the FIFO into the destination frame.
    pub fn pop(&mut self) -> Result<&Frame> {
        self.take(self.dst_nb_samples)?;
        Ok(&self.frame)
    }

    /// Push `src` and return a cursor over every full frame now available.
    pub fn convert(&mut self, src: Option<&Frame>) -> Result<Converted<'_>> {
        self.push(src)?;
        Ok(Converted { rebuffer: self })
    }

    /// Flush the backend and return a cursor over the resulting full frames.
    pub fn flush(&mut self) -> Result<Converted<'_>> {
        self.convert(None)
    }

    /// Push `src` and pop at most one frame, with sample accounting.
    ///
    /// A frame is popped only when a full `dst_nb_samples` are buffered; no
    /// short frame is ever popped here. Otherwise `frame` is `None`,
    /// `out_samples` is zero and the samples stay cached for the next call
    /// or for [`drain_remainder`](Self::drain_remainder).
    pub fn convert_frame(&mut self, src: Option<&Frame>) -> Result<ConvertedFrame<'_>> {
        self.push(src)?;
        if self.fifo.size() >= self.dst_nb_samples {
            self.take(self.dst_nb_samples)?;
            Ok(ConvertedFrame {
                frame: Some(&self.frame),
                out_samples: self.dst_nb_samples,
                cache_samples: self.fifo.size(),
            })
        } else {
            Ok(ConvertedFrame {
                frame: None,
                out_samples: 0,
                cache_samples: self.fifo.size(),
            })
        }
    }

    /// Hand out the trailing partial frame left after a flush.
    ///
    /// Returns `None` when the FIFO is empty. The returned frame holds fewer
    /// than `dst_nb_samples` samples only if that is all that is left.
    pub fn drain_remainder(&mut self) -> Result<Option<&Frame>> {
        let remaining = self.fifo.size().min(self.dst_nb_samples);
        if remaining == 0 {
            return Ok(None);
        }
        self.take(remaining)?;
        Ok(Some(&self.frame))
    }

    /// Drop all buffered samples and restart timestamps at zero.
    ///
    /// Source parameters stay fixed.
    pub fn reset(&mut self) {
        self.fifo.reset();
        if let Some(backend) = self.backend.as_mut() {
            backend.reset();
        }
        self.samples_out = 0;
    }

    fn ensure_backend(&mut self, buffer: &SampleBuffer) -> Result<()> {
        let params = ResampleParams::of(buffer);
        match self.src {
            Some(src) if src == params => Ok(()),
            Some(src) => Err(ResampleError::SourceChanged {
                expected_format: src.format,
                expected_layout: src.layout,
                expected_rate: src.sample_rate,
                format: params.format,
                layout: params.layout,
                rate: params.sample_rate,
            }),
            None => {
                params.validate()?;
                self.backend = Some((self.factory)(params, self.dst)?);
                self.src = Some(params);
                debug!(
                    src_format = %params.format,
                    src_rate = params.sample_rate,
                    dst_nb_samples = self.dst_nb_samples,
                    "rebuffer source parameters fixed"
                );
                Ok(())
            }
        }
    }

    fn take(&mut self, count: usize) -> Result<()> {
        let Some(buffer) = self.frame.samples_mut() else {
            return Err(ResampleError::internal("destination frame lost its samples"));
        };
        self.fifo.read_buffer(buffer, count)?;

        let time_base = TimeBase::for_sample_rate(self.dst.sample_rate);
        self.frame.pts = Timestamp::new(self.samples_out as i64, time_base);
        self.frame.duration = Duration::new(count as i64, time_base);
        self.samples_out += count as u64;
        Ok(())
    }
}

impl std::fmt::Debug for AudioRebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioRebuffer")
            .field("dst", &self.dst)
            .field("dst_nb_samples", &self.dst_nb_samples)
            .field("src", &self.src)
            .field("fifo", &self.fifo)
            .finish()
    }
}

/// Pull cursor over the full frames produced by one [`AudioRebuffer::convert`].
///
/// Each call to [`next_frame`](Self::next_frame) pops one frame. The frame is
/// the rebuffer's reusable destination frame, so it has to be cloned to be
/// kept past the next pull.
pub struct Converted<'a> {
    rebuffer: &'a mut AudioRebuffer,
}

impl<'a> Converted<'a> {
    /// Pop the next full frame, or `None` once fewer than `dst_nb_samples` remain.
    pub fn next_frame(&mut self) -> Result<Option<&Frame>> {
        if self.rebuffer.size() < self.rebuffer.dst_nb_samples {
            return Ok(None);
        }
        self.rebuffer.pop().map(Some)
    }

    /// Run `f` on every remaining frame.
    pub fn for_each<F>(mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&Frame),
    {
        while let Some(frame) = self.next_frame()? {
            f(frame);
        }
        Ok(())
    }

    /// Clone every remaining frame into a vector.
    pub fn collect_owned(self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        self.for_each(|frame| frames.push(frame.clone()))?;
        Ok(frames)
    }

    /// Samples left in the FIFO.
    pub fn remaining(&self) -> usize {
        self.rebuffer.size()
    }
}

impl std::fmt::Debug for Converted<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converted")
            .field("dst_nb_samples", &self.rebuffer.dst_nb_samples)
            .field("remaining", &self.rebuffer.size())
            .finish()
    }
}

/// Result of [`AudioRebuffer::convert_frame`].
#[derive(Debug)]
pub struct ConvertedFrame<'a> {
    /// The popped frame, if a full frame was available.
    pub frame: Option<&'a Frame>,
    /// Samples emitted by this call.
    pub out_samples: usize,
    /// Samples left in the FIFO.
    pub cache_samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn mono_s16(count: usize, rate: u32) -> Frame {
        let mut buffer = SampleBuffer::new(count, SampleFormat::S16, ChannelLayout::Mono, rate);
        for (i, slot) in buffer.data_mut().chunks_exact_mut(2).enumerate() {
            slot.copy_from_slice(&((i % 1000) as i16).to_ne_bytes());
        }
        Frame::audio(buffer)
    }

    fn identity() -> AudioRebuffer {
        AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 1024, 48000).unwrap()
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 0, 48000),
            Err(ResampleError::InvalidFrameSize { size: 0 })
        ));
        assert!(matches!(
            AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 1024, 0),
            Err(ResampleError::InvalidSampleRate { rate: 0 })
        ));
        assert!(
            AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Custom(0), 1024, 48000).is_err()
        );
    }

    #[test]
    fn test_chunking_determinism() {
        let mut rebuffer = identity();

        let frames = rebuffer
            .convert(Some(&mono_s16(3000, 48000)))
            .unwrap()
            .collect_owned()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.num_samples() == 1024));
        assert_eq!(rebuffer.size(), 952);

        assert_eq!(rebuffer.push(Some(&mono_s16(100, 48000))).unwrap(), 1052);
        assert_eq!(rebuffer.pop().unwrap().num_samples(), 1024);
        assert_eq!(rebuffer.size(), 28);
    }

    #[test]
    fn test_pop_without_enough_samples() {
        let mut rebuffer = identity();
        rebuffer.push(Some(&mono_s16(10, 48000))).unwrap();
        assert!(matches!(
            rebuffer.pop(),
            Err(ResampleError::InsufficientSamples { needed: 1024, available: 10 })
        ));
        assert_eq!(rebuffer.size(), 10);
    }

    #[test]
    fn test_convert_frame_accounting() {
        let mut rebuffer = identity();

        let first = rebuffer.convert_frame(Some(&mono_s16(600, 48000))).unwrap();
        assert!(first.frame.is_none());
        assert_eq!(first.out_samples, 0);
        assert_eq!(first.cache_samples, 600);

        let second = rebuffer.convert_frame(Some(&mono_s16(600, 48000))).unwrap();
        assert_eq!(second.frame.map(Frame::num_samples), Some(1024));
        assert_eq!(second.out_samples, 1024);
        assert_eq!(second.cache_samples, 176);
    }

    #[test]
    fn test_convert_frame_never_pops_short_frame() {
        let mut rebuffer = identity();
        rebuffer.convert_frame(Some(&mono_s16(600, 48000))).unwrap();

        let flushed = rebuffer.convert_frame(None).unwrap();
        assert!(flushed.frame.is_none());
        assert_eq!(flushed.out_samples, 0);
        assert_eq!(flushed.cache_samples, 600);
        assert_eq!(rebuffer.drain_remainder().unwrap().map(Frame::num_samples), Some(600));
    }

    #[test]
    fn test_converted_debug_reports_remaining() {
        let mut rebuffer = identity();
        let converted = rebuffer.convert(Some(&mono_s16(3000, 48000))).unwrap();
        let text = format!("{converted:?}");
        assert!(text.starts_with("Converted"));
        assert!(text.contains("remaining: 3000"));
    }

    #[test]
    fn test_timestamps_follow_popped_samples() {
        let mut rebuffer = identity();
        let frames = rebuffer
            .convert(Some(&mono_s16(2048, 48000)))
            .unwrap()
            .collect_owned()
            .unwrap();
        assert_eq!(frames[0].pts.value, 0);
        assert_eq!(frames[1].pts.value, 1024);
        assert_eq!(frames[1].pts.time_base, TimeBase::for_sample_rate(48000));
        assert_eq!(frames[1].duration.value, 1024);
    }

    #[test]
    fn test_source_change_rejected() {
        let mut rebuffer = identity();
        rebuffer.push(Some(&mono_s16(10, 48000))).unwrap();
        let err = rebuffer.push(Some(&mono_s16(10, 44100))).unwrap_err();
        assert!(matches!(err, ResampleError::SourceChanged { .. }));
        assert_eq!(rebuffer.size(), 10);
    }

    #[test]
    fn test_video_frame_rejected() {
        let mut rebuffer = identity();
        let video = Frame::new_video(16, 16, avpump_core::PixelFormat::Yuv420p);
        assert!(matches!(rebuffer.push(Some(&video)), Err(ResampleError::NotAudio)));
    }

    #[test]
    fn test_flush_before_any_input_is_noop() {
        let mut rebuffer = identity();
        assert_eq!(rebuffer.flush().unwrap().collect_owned().unwrap().len(), 0);
        assert!(rebuffer.source().is_none());
    }

    #[test]
    fn test_drain_remainder() {
        let mut rebuffer = identity();
        rebuffer.convert(Some(&mono_s16(1500, 48000))).unwrap().collect_owned().unwrap();
        rebuffer.flush().unwrap().collect_owned().unwrap();

        let tail = rebuffer.drain_remainder().unwrap().cloned().unwrap();
        assert_eq!(tail.num_samples(), 476);
        assert_eq!(tail.pts.value, 1024);
        assert!(rebuffer.drain_remainder().unwrap().is_none());

        // The destination frame regains its full size on the next pop.
        rebuffer.push(Some(&mono_s16(1024, 48000))).unwrap();
        assert_eq!(rebuffer.pop().unwrap().num_samples(), 1024);
    }

    #[test]
    fn test_upsampling_expands_into_multiple_chunks() {
        let mut rebuffer =
            AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 256, 48000).unwrap();

        // 1000 samples at 8kHz become ~6000 at 48kHz, far more than one chunk.
        rebuffer.push(Some(&mono_s16(1000, 8000))).unwrap();
        let before_flush = rebuffer.size();
        assert!(before_flush >= 5990 && before_flush <= 6000, "got {before_flush}");

        rebuffer.push(None).unwrap();
        assert_eq!(rebuffer.size(), 6000);
        assert_eq!(rebuffer.delay(), 0);
    }

    struct CountingBackend {
        inner: ResampleContext,
        drops: Arc<AtomicUsize>,
    }

    impl ResampleBackend for CountingBackend {
        fn convert(
            &mut self,
            dst: &mut SampleBuffer,
            capacity: usize,
            input: ConvertInput<'_>,
        ) -> Result<usize> {
            self.inner.convert(dst, capacity, input)
        }

        fn delay(&self) -> usize {
            self.inner.delay()
        }

        fn reset(&mut self) {
            self.inner.reset();
        }
    }

    impl Drop for CountingBackend {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_abandoned_iteration_releases_backend_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&drops);
        let mut rebuffer = AudioRebuffer::with_backend(
            SampleFormat::S16,
            ChannelLayout::Mono,
            100,
            48000,
            Box::new(move |src, dst| {
                Ok(Box::new(CountingBackend {
                    inner: ResampleContext::new(src, dst)?,
                    drops: Arc::clone(&counter),
                }) as Box<dyn ResampleBackend>)
            }),
        )
        .unwrap();

        {
            let mut frames = rebuffer.convert(Some(&mono_s16(1000, 48000))).unwrap();
            assert!(frames.next_frame().unwrap().is_some());
            // Abandon the remaining nine frames.
        }
        assert_eq!(rebuffer.size(), 900);
        drop(rebuffer);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}

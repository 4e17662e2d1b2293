//! Linear interpolation resampler.
//!
//! Streaming rate converter over planar `f64` channels. Output sample `k`
//! sits at input time `k * input_rate / output_rate`; its value interpolates
//! the two input samples around that time. Interpolating needs one sample of
//! look-ahead, which is held back until more input arrives or the stream is
//! flushed (the flush repeats the last input sample as the right neighbour).

use crate::error::{ResampleError, Result};

/// Linear interpolation resampler.
///
/// # Quality Characteristics
/// - Introduces aliasing artifacts
/// - High-frequency content is attenuated
/// - Suitable for voice content and previews
#[derive(Debug, Clone)]
pub struct LinearResampler {
    input_rate: u32,
    output_rate: u32,
    /// Input samples not yet fully consumed, per channel.
    history: Vec<Vec<f64>>,
    /// Position of the next output, in units of `1 / output_rate` input
    /// samples, relative to `history[_][0]`.
    phase: u64,
}

impl LinearResampler {
    /// Create a new linear resampler.
    ///
    /// # Errors
    /// Returns an error if sample rates or channel count are invalid.
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> Result<Self> {
        if input_rate == 0 {
            return Err(ResampleError::InvalidSampleRate { rate: input_rate });
        }
        if output_rate == 0 {
            return Err(ResampleError::InvalidSampleRate { rate: output_rate });
        }
        if channels == 0 {
            return Err(ResampleError::InvalidChannelCount { count: channels });
        }

        Ok(Self {
            input_rate,
            output_rate,
            history: vec![Vec::new(); channels],
            phase: 0,
        })
    }

    /// Perform linear interpolation between two samples.
    #[inline]
    fn interpolate(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Get the input sample rate.
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Get the output sample rate.
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Get the resampling ratio (output_rate / input_rate).
    pub fn ratio(&self) -> f64 {
        f64::from(self.output_rate) / f64::from(self.input_rate)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.history.len()
    }

    /// Input samples held back waiting for look-ahead.
    pub fn latency(&self) -> usize {
        self.history[0].len()
    }

    /// Feed `input` (one slice per channel) and append ready output to `output`.
    pub fn process(&mut self, input: &[Vec<f64>], output: &mut [Vec<f64>]) -> Result<usize> {
        self.check_channels(input.len())?;
        self.check_channels(output.len())?;
        let len = input[0].len();
        if input.iter().any(|ch| ch.len() != len) {
            return Err(ResampleError::mismatch(
                format!("{len} samples in every channel"),
                "ragged channel lengths",
            ));
        }

        for (history, samples) in self.history.iter_mut().zip(input) {
            history.extend_from_slice(samples);
        }
        Ok(self.emit(output, false))
    }

    /// Emit everything still held back, treating the stream as ended.
    pub fn flush(&mut self, output: &mut [Vec<f64>]) -> Result<usize> {
        self.check_channels(output.len())?;
        let produced = self.emit(output, true);
        self.reset();
        Ok(produced)
    }

    /// Reset the resampler state (clear internal buffers).
    pub fn reset(&mut self) {
        for history in &mut self.history {
            history.clear();
        }
        self.phase = 0;
    }

    fn check_channels(&self, count: usize) -> Result<()> {
        if count != self.history.len() {
            return Err(ResampleError::InvalidChannelCount { count });
        }
        Ok(())
    }

    fn emit(&mut self, output: &mut [Vec<f64>], flushing: bool) -> usize {
        let available = self.history[0].len() as u64;
        let out_rate = u64::from(self.output_rate);
        let in_rate = u64::from(self.input_rate);
        let mut produced = 0;

        loop {
            let index = self.phase / out_rate;
            let ready = if flushing {
                index < available
            } else {
                index + 1 < available
            };
            if !ready {
                break;
            }

            let frac = (self.phase % out_rate) as f64 / out_rate as f64;
            let index = index as usize;
            for (history, out) in self.history.iter().zip(output.iter_mut()) {
                let a = history[index];
                let b = history.get(index + 1).copied().unwrap_or(a);
                out.push(Self::interpolate(a, b, frac));
            }
            self.phase += in_rate;
            produced += 1;
        }

        // Drop input that no future output can reference.
        let consumed = ((self.phase / out_rate) as usize).min(self.history[0].len());
        if consumed > 0 {
            for history in &mut self.history {
                history.drain(..consumed);
            }
            self.phase -= consumed as u64 * out_rate;
        }
        produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<Vec<f64>> {
        vec![(0..len).map(|i| i as f64).collect()]
    }

    #[test]
    fn test_linear_resampler_creation() {
        let resampler = LinearResampler::new(44100, 48000, 2).unwrap();
        assert_eq!(resampler.input_rate(), 44100);
        assert_eq!(resampler.output_rate(), 48000);
        assert_eq!(resampler.channels(), 2);
    }

    #[test]
    fn test_linear_resampler_invalid_rates() {
        assert!(LinearResampler::new(0, 48000, 2).is_err());
        assert!(LinearResampler::new(44100, 0, 2).is_err());
        assert!(LinearResampler::new(44100, 48000, 0).is_err());
    }

    #[test]
    fn test_linear_interpolate() {
        assert_eq!(LinearResampler::interpolate(0.0, 1.0, 0.0), 0.0);
        assert_eq!(LinearResampler::interpolate(0.0, 1.0, 1.0), 1.0);
        assert_eq!(LinearResampler::interpolate(-1.0, 1.0, 0.5), 0.0);
    }

    #[test]
    fn test_upsample_doubles_ramp() {
        let mut resampler = LinearResampler::new(1, 2, 1).unwrap();
        let mut out = vec![Vec::new()];
        resampler.process(&ramp(4), &mut out).unwrap();
        resampler.flush(&mut out).unwrap();
        assert_eq!(out[0], vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.0]);
    }

    #[test]
    fn test_holds_one_sample_of_lookahead() {
        let mut resampler = LinearResampler::new(2, 3, 1).unwrap();
        let mut out = vec![Vec::new()];
        resampler.process(&ramp(1), &mut out).unwrap();
        assert!(out[0].is_empty());
        assert_eq!(resampler.latency(), 1);
    }

    #[test]
    fn test_downsample_total_count() {
        let mut resampler = LinearResampler::new(48000, 24000, 1).unwrap();
        let mut out = vec![Vec::new()];
        for _ in 0..10 {
            resampler.process(&ramp(37), &mut out).unwrap();
        }
        resampler.flush(&mut out).unwrap();
        // ceil(370 * 24000 / 48000)
        assert_eq!(out[0].len(), 185);
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let input: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();

        let mut whole = LinearResampler::new(44100, 48000, 1).unwrap();
        let mut expected = vec![Vec::new()];
        whole.process(&[input.clone()], &mut expected).unwrap();
        whole.flush(&mut expected).unwrap();

        let mut chunked = LinearResampler::new(44100, 48000, 1).unwrap();
        let mut actual = vec![Vec::new()];
        for chunk in input.chunks(7) {
            chunked.process(&[chunk.to_vec()], &mut actual).unwrap();
        }
        chunked.flush(&mut actual).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_ragged_input_rejected() {
        let mut resampler = LinearResampler::new(44100, 48000, 2).unwrap();
        let mut out = vec![Vec::new(), Vec::new()];
        let input = vec![vec![0.0; 4], vec![0.0; 3]];
        assert!(resampler.process(&input, &mut out).is_err());
    }

    #[test]
    fn test_reset() {
        let mut resampler = LinearResampler::new(44100, 48000, 1).unwrap();
        let mut out = vec![Vec::new()];
        resampler.process(&ramp(10), &mut out).unwrap();
        resampler.reset();
        assert_eq!(resampler.latency(), 0);
    }
}

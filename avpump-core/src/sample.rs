//! Audio sample buffer abstractions.
//!
//! Provides the sample format and channel layout descriptions shared by the
//! resampler, the FIFO and the codec sessions, plus the owned sample storage
//! carried by audio [`Frame`](crate::Frame)s.

use crate::timestamp::{Duration, TimeBase};
use std::fmt;

/// Sample format for audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit, native endian.
    S16,
    /// Signed 32-bit, native endian.
    S32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Unsigned 8-bit planar.
    U8p,
    /// Signed 16-bit planar.
    S16p,
    /// Signed 32-bit planar.
    S32p,
    /// 32-bit float planar.
    F32p,
    /// 64-bit float planar.
    F64p,
}

impl SampleFormat {
    /// Get the number of bytes per sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 | Self::U8p => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
            Self::F64 | Self::F64p => 8,
        }
    }

    /// Check if this is a planar format.
    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::F32p | Self::F64p
        )
    }

    /// Get the packed equivalent of this format.
    pub fn to_packed(&self) -> Self {
        match self {
            Self::U8p => Self::U8,
            Self::S16p => Self::S16,
            Self::S32p => Self::S32,
            Self::F32p => Self::F32,
            Self::F64p => Self::F64,
            other => *other,
        }
    }

    /// Number of storage planes for `channels` channels in this format.
    pub fn plane_count(&self, channels: usize) -> usize {
        if self.is_planar() {
            channels
        } else {
            1
        }
    }

    /// Bytes one sample slot occupies inside a single plane.
    ///
    /// For packed formats a slot holds one sample of every channel.
    pub fn slot_size(&self, channels: usize) -> usize {
        if self.is_planar() {
            self.bytes_per_sample()
        } else {
            self.bytes_per_sample() * channels
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::S16 => write!(f, "s16"),
            Self::S32 => write!(f, "s32"),
            Self::F32 => write!(f, "flt"),
            Self::F64 => write!(f, "dbl"),
            Self::U8p => write!(f, "u8p"),
            Self::S16p => write!(f, "s16p"),
            Self::S32p => write!(f, "s32p"),
            Self::F32p => write!(f, "fltp"),
            Self::F64p => write!(f, "dblp"),
        }
    }
}

/// Channel layout for audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Mono (1 channel).
    Mono,
    /// Stereo (2 channels: left, right).
    #[default]
    Stereo,
    /// 2.1 (3 channels: left, right, LFE).
    Surround21,
    /// Quad (4 channels: FL, FR, BL, BR).
    Quad,
    /// 5.0 (5 channels: FL, FR, FC, BL, BR).
    Surround50,
    /// 5.1 (6 channels: FL, FR, FC, LFE, BL, BR).
    Surround51,
    /// 7.1 (8 channels: FL, FR, FC, LFE, BL, BR, SL, SR).
    Surround71,
    /// Custom layout with specified channel count.
    Custom(u32),
}

impl ChannelLayout {
    /// Get the number of channels.
    pub fn channels(&self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround21 => 3,
            Self::Quad => 4,
            Self::Surround50 => 5,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
            Self::Custom(n) => *n,
        }
    }

    /// Create a layout from channel count.
    pub fn from_channels(channels: u32) -> Self {
        match channels {
            1 => Self::Mono,
            2 => Self::Stereo,
            6 => Self::Surround51,
            8 => Self::Surround71,
            n => Self::Custom(n),
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono => write!(f, "mono"),
            Self::Stereo => write!(f, "stereo"),
            Self::Surround21 => write!(f, "2.1"),
            Self::Quad => write!(f, "quad"),
            Self::Surround50 => write!(f, "5.0"),
            Self::Surround51 => write!(f, "5.1"),
            Self::Surround71 => write!(f, "7.1"),
            Self::Custom(n) => write!(f, "{}ch", n),
        }
    }
}

/// Buffer for storing audio sample data.
///
/// Planar formats keep one plane per channel, packed formats a single
/// interleaved plane. Plane lengths always match `num_samples` exactly.
#[derive(Clone, PartialEq)]
pub struct SampleBuffer {
    /// Number of samples per channel.
    num_samples: usize,
    /// Sample format.
    pub format: SampleFormat,
    /// Channel layout.
    pub layout: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    data: Vec<Vec<u8>>,
}

impl SampleBuffer {
    /// Create a new zeroed sample buffer.
    pub fn new(
        num_samples: usize,
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        let channels = layout.channels() as usize;
        let slot = format.slot_size(channels);
        let data = (0..format.plane_count(channels))
            .map(|_| vec![0u8; num_samples * slot])
            .collect();

        let mut buffer = Self {
            num_samples,
            format,
            layout,
            sample_rate,
            data,
        };
        buffer.silence();
        buffer
    }

    /// Number of samples per channel.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.layout.channels() as usize
    }

    /// Bytes one sample slot occupies inside a plane.
    pub fn slot_size(&self) -> usize {
        self.format.slot_size(self.channels())
    }

    /// Resize every plane to hold `num_samples` samples.
    ///
    /// Existing samples are kept; new samples are silent.
    pub fn set_num_samples(&mut self, num_samples: usize) {
        if num_samples == self.num_samples {
            return;
        }
        let slot = self.slot_size();
        let fill = self.silence_value();
        for plane in &mut self.data {
            plane.resize(num_samples * slot, fill);
        }
        self.num_samples = num_samples;
    }

    /// Get the duration of this buffer.
    pub fn duration(&self) -> Duration {
        Duration::new(
            self.num_samples as i64,
            TimeBase::for_sample_rate(self.sample_rate),
        )
    }

    /// Get the total size in bytes.
    pub fn size(&self) -> usize {
        self.data.iter().map(|d| d.len()).sum()
    }

    /// All planes in storage order.
    pub fn planes(&self) -> &[Vec<u8>] {
        &self.data
    }

    /// Mutable access to all planes.
    ///
    /// Plane lengths must not be changed; use [`set_num_samples`](Self::set_num_samples).
    pub fn planes_mut(&mut self) -> &mut [Vec<u8>] {
        &mut self.data
    }

    /// Get a channel's data (for planar formats).
    pub fn channel(&self, index: u32) -> Option<&[u8]> {
        if self.format.is_planar() {
            self.data.get(index as usize).map(|v| v.as_slice())
        } else {
            None
        }
    }

    /// Get interleaved data (for packed formats, or the first plane).
    pub fn data(&self) -> &[u8] {
        &self.data[0]
    }

    /// Get mutable interleaved data.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[0]
    }

    fn silence_value(&self) -> u8 {
        match self.format {
            SampleFormat::U8 | SampleFormat::U8p => 128,
            _ => 0,
        }
    }

    /// Fill all channels with silence.
    pub fn silence(&mut self) {
        let value = self.silence_value();
        for plane in &mut self.data {
            plane.fill(value);
        }
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("num_samples", &self.num_samples)
            .field("format", &self.format)
            .field("layout", &self.layout)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format() {
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert!(!SampleFormat::S16.is_planar());
        assert!(SampleFormat::S16p.is_planar());
        assert_eq!(SampleFormat::S16.slot_size(2), 4);
        assert_eq!(SampleFormat::S16p.slot_size(2), 2);
    }

    #[test]
    fn test_channel_layout() {
        assert_eq!(ChannelLayout::Stereo.channels(), 2);
        assert_eq!(ChannelLayout::Surround51.channels(), 6);
        assert_eq!(ChannelLayout::from_channels(2), ChannelLayout::Stereo);
        assert_eq!(ChannelLayout::from_channels(3), ChannelLayout::Custom(3));
    }

    #[test]
    fn test_sample_buffer_creation() {
        let buffer = SampleBuffer::new(1024, SampleFormat::S16, ChannelLayout::Stereo, 48000);
        assert_eq!(buffer.num_samples(), 1024);
        assert_eq!(buffer.size(), 1024 * 2 * 2);
        assert_eq!(buffer.planes().len(), 1);
    }

    #[test]
    fn test_planar_buffer() {
        let buffer = SampleBuffer::new(1024, SampleFormat::F32p, ChannelLayout::Stereo, 48000);
        assert!(buffer.channel(0).is_some());
        assert!(buffer.channel(1).is_some());
        assert!(buffer.channel(2).is_none());
        assert_eq!(buffer.planes().len(), 2);
    }

    #[test]
    fn test_u8_silence_is_midpoint() {
        let buffer = SampleBuffer::new(4, SampleFormat::U8, ChannelLayout::Mono, 8000);
        assert!(buffer.data().iter().all(|&b| b == 128));
    }

    #[test]
    fn test_set_num_samples_keeps_prefix() {
        let mut buffer = SampleBuffer::new(2, SampleFormat::S16p, ChannelLayout::Stereo, 48000);
        buffer.planes_mut()[1][..2].copy_from_slice(&7i16.to_ne_bytes());
        buffer.set_num_samples(8);
        assert_eq!(buffer.planes()[1].len(), 16);
        assert_eq!(&buffer.planes()[1][..2], &7i16.to_ne_bytes());
        buffer.set_num_samples(1);
        assert_eq!(buffer.planes()[0].len(), 2);
    }

    #[test]
    fn test_set_num_samples_pads_unsigned_with_midpoint() {
        let mut buffer = SampleBuffer::new(2, SampleFormat::U8, ChannelLayout::Mono, 8000);
        buffer.data_mut().fill(1);
        buffer.set_num_samples(4);
        assert_eq!(buffer.data(), &[1, 1, 128, 128]);
    }
}

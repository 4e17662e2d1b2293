//! Codec session configuration.

use crate::codec::MediaType;
use avpump_core::{ChannelLayout, Error, PixelFormat, Result, SampleFormat, TimeBase};

/// Audio stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    /// Sample format of frames exchanged with the codec.
    pub sample_format: SampleFormat,
    /// Channel layout.
    pub channel_layout: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Video stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoParams {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format of frames exchanged with the codec.
    pub pixel_format: PixelFormat,
}

/// Configuration for opening a codec session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Audio parameters, for audio codecs.
    pub audio: Option<AudioParams>,
    /// Video parameters, for video codecs.
    pub video: Option<VideoParams>,
    /// Target bitrate in bits per second.
    pub bit_rate: Option<u64>,
    /// Time base of frame and packet timestamps.
    pub time_base: TimeBase,
}

impl CodecConfig {
    /// Audio configuration. The time base defaults to `1/sample_rate`.
    pub fn audio(
        sample_format: SampleFormat,
        channel_layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        Self {
            audio: Some(AudioParams {
                sample_format,
                channel_layout,
                sample_rate,
            }),
            video: None,
            bit_rate: None,
            time_base: TimeBase::for_sample_rate(sample_rate),
        }
    }

    /// Video configuration. The time base defaults to 90kHz.
    pub fn video(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            audio: None,
            video: Some(VideoParams {
                width,
                height,
                pixel_format,
            }),
            bit_rate: None,
            time_base: TimeBase::MPEG,
        }
    }

    /// Set the target bitrate.
    #[must_use]
    pub fn with_bit_rate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Set the time base.
    #[must_use]
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Reject parameter sets no codec could open with.
    pub fn validate(&self, media_type: MediaType) -> Result<()> {
        match media_type {
            MediaType::Audio => {
                let audio = self
                    .audio
                    .as_ref()
                    .ok_or_else(|| Error::invalid_config("audio codec requires audio parameters"))?;
                if audio.sample_rate == 0 {
                    return Err(Error::invalid_config("sample rate must be positive"));
                }
                if audio.channel_layout.channels() == 0 {
                    return Err(Error::invalid_config("channel count must be positive"));
                }
            }
            MediaType::Video => {
                let video = self
                    .video
                    .as_ref()
                    .ok_or_else(|| Error::invalid_config("video codec requires video parameters"))?;
                if video.width == 0 || video.height == 0 {
                    return Err(Error::invalid_config(format!(
                        "invalid dimensions {}x{}",
                        video.width, video.height
                    )));
                }
            }
        }
        if self.bit_rate == Some(0) {
            return Err(Error::invalid_config("bit rate must be positive"));
        }
        Ok(())
    }
}

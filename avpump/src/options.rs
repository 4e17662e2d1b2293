//! Audio encoding options.

use avpump_codec::{CodecConfig, CodecId};
use avpump_core::{ChannelLayout, Error, Result, SampleFormat};

/// Frame size used when the codec accepts frames of any length.
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Options for an [`AudioEncodePipeline`](crate::AudioEncodePipeline), using
/// the builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncodeOptions {
    /// Encoder name, e.g. `pcm_s16le`.
    pub codec: Option<String>,
    /// Sample format the encoder is fed.
    pub sample_format: SampleFormat,
    /// Channel layout the encoder is fed.
    pub channel_layout: ChannelLayout,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Target bitrate.
    pub bitrate: Option<u64>,
    /// Samples per frame when the codec does not impose a size.
    pub frame_size: usize,
}

impl Default for AudioEncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncodeOptions {
    /// Stereo 16-bit 48kHz, no codec selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codec: None,
            sample_format: SampleFormat::S16,
            channel_layout: ChannelLayout::Stereo,
            sample_rate: 48000,
            bitrate: None,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }

    /// Set the encoder.
    #[must_use]
    pub fn codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    /// Set the sample format.
    #[must_use]
    pub fn sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = format;
        self
    }

    /// Set the channel layout.
    #[must_use]
    pub fn channel_layout(mut self, layout: ChannelLayout) -> Self {
        self.channel_layout = layout;
        self
    }

    /// Set the output sample rate.
    #[must_use]
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the target bitrate.
    #[must_use]
    pub fn bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Set the frame size used for codecs without a fixed one.
    #[must_use]
    pub fn frame_size(mut self, samples: usize) -> Self {
        self.frame_size = samples;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        if self.codec.as_deref().map_or(true, str::is_empty) {
            return Err(Error::invalid_config("Audio codec not specified"));
        }
        if self.sample_rate == 0 {
            return Err(Error::invalid_config("Sample rate must be positive"));
        }
        if self.channel_layout.channels() == 0 {
            return Err(Error::invalid_config("Channel count must be positive"));
        }
        if self.frame_size == 0 {
            return Err(Error::invalid_config("Frame size must be positive"));
        }
        Ok(())
    }

    /// The encoder id, once validated.
    pub(crate) fn codec_id(&self) -> CodecId {
        CodecId::new(self.codec.clone().unwrap_or_default())
    }

    /// Codec configuration for these options.
    pub fn codec_config(&self) -> CodecConfig {
        let config = CodecConfig::audio(self.sample_format, self.channel_layout, self.sample_rate);
        match self.bitrate {
            Some(bitrate) => config.with_bit_rate(bitrate),
            None => config,
        }
    }
}

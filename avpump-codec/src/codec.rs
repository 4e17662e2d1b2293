//! Codec identity and capabilities.

use crate::config::CodecConfig;
use avpump_core::{ChannelLayout, Error, PixelFormat, Result, SampleFormat};
use std::fmt;

/// Codec name as registered with an engine (e.g. `pcm_s16le`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodecId(String);

impl CodecId {
    /// Create a codec id.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The codec name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodecId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Kind of media a codec handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Audio samples.
    Audio,
    /// Video pictures.
    Video,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Audio => write!(f, "audio"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

/// Whether a descriptor names an encoder or a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Frames in, packets out.
    Encode,
    /// Packets in, frames out.
    Decode,
}

/// What a codec accepts. Empty lists accept anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecCapabilities {
    /// Accepted sample formats.
    pub sample_formats: Vec<SampleFormat>,
    /// Accepted sample rates.
    pub sample_rates: Vec<u32>,
    /// Accepted channel layouts.
    pub channel_layouts: Vec<ChannelLayout>,
    /// Accepted pixel formats.
    pub pixel_formats: Vec<PixelFormat>,
}

impl CodecCapabilities {
    /// Capabilities that accept anything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict sample formats.
    #[must_use]
    pub fn with_sample_formats(mut self, formats: impl IntoIterator<Item = SampleFormat>) -> Self {
        self.sample_formats = formats.into_iter().collect();
        self
    }

    /// Restrict sample rates.
    #[must_use]
    pub fn with_sample_rates(mut self, rates: impl IntoIterator<Item = u32>) -> Self {
        self.sample_rates = rates.into_iter().collect();
        self
    }

    /// Restrict channel layouts.
    #[must_use]
    pub fn with_channel_layouts(
        mut self,
        layouts: impl IntoIterator<Item = ChannelLayout>,
    ) -> Self {
        self.channel_layouts = layouts.into_iter().collect();
        self
    }

    /// Restrict pixel formats.
    #[must_use]
    pub fn with_pixel_formats(mut self, formats: impl IntoIterator<Item = PixelFormat>) -> Self {
        self.pixel_formats = formats.into_iter().collect();
        self
    }

    /// Check `config` against these capabilities.
    pub fn check(&self, codec: &CodecId, config: &CodecConfig) -> Result<()> {
        if let Some(audio) = &config.audio {
            check_listed(codec, "sample format", &self.sample_formats, &audio.sample_format)?;
            check_listed(codec, "sample rate", &self.sample_rates, &audio.sample_rate)?;
            check_listed(codec, "channel layout", &self.channel_layouts, &audio.channel_layout)?;
        }
        if let Some(video) = &config.video {
            check_listed(codec, "pixel format", &self.pixel_formats, &video.pixel_format)?;
        }
        Ok(())
    }
}

fn check_listed<T>(codec: &CodecId, what: &str, allowed: &[T], value: &T) -> Result<()>
where
    T: PartialEq + fmt::Display,
{
    if allowed.is_empty() || allowed.contains(value) {
        Ok(())
    } else {
        Err(Error::unsupported(format!("{codec} does not support {what} {value}")))
    }
}

/// An engine's description of one encoder or decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
    /// Codec id.
    pub id: CodecId,
    /// Descriptive name.
    pub long_name: String,
    /// Media handled.
    pub media_type: MediaType,
    /// Encoder or decoder.
    pub direction: Direction,
    /// What the codec accepts.
    pub capabilities: CodecCapabilities,
}

impl CodecDescriptor {
    /// Create a descriptor accepting anything.
    pub fn new(
        id: impl Into<CodecId>,
        long_name: impl Into<String>,
        media_type: MediaType,
        direction: Direction,
    ) -> Self {
        Self {
            id: id.into(),
            long_name: long_name.into(),
            media_type,
            direction,
            capabilities: CodecCapabilities::any(),
        }
    }

    /// Replace the capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: CodecCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether this is an encoder.
    pub fn is_encoder(&self) -> bool {
        self.direction == Direction::Encode
    }
}

//! Raw media frames.
//!
//! A [`Frame`] carries either decoded audio samples or a decoded video
//! picture. Freshly allocated frames carry nothing until an engine or a
//! resampler fills them, which lets a pump keep one untyped scratch frame.

use crate::packet::{SideData, SideDataType};
use crate::sample::{ChannelLayout, SampleBuffer, SampleFormat};
use crate::timestamp::{Duration, Timestamp};
use bitflags::bitflags;
use std::fmt;

/// Pixel format for video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp.
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp.
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp.
    Yuv444p,
    /// Y plane plus interleaved UV plane, 4:2:0.
    Nv12,
    /// Packed RGB24, 24bpp.
    Rgb24,
    /// Packed RGBA, 32bpp.
    Rgba,
    /// Grayscale, 8bpp.
    Gray8,
}

impl PixelFormat {
    /// Get the number of planes for this pixel format.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 => 2,
            Self::Rgb24 | Self::Rgba | Self::Gray8 => 1,
        }
    }

    /// Get chroma subsampling factors (horizontal, vertical).
    pub fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Nv12 => (2, 2),
            Self::Yuv422p => (2, 1),
            _ => (1, 1),
        }
    }

    /// Row stride and row count of a plane.
    fn plane_geometry(&self, plane: usize, width: u32, height: u32) -> (usize, usize) {
        let (w, h) = (width as usize, height as usize);
        let (hsub, vsub) = self.chroma_subsampling();
        let (hsub, vsub) = (hsub as usize, vsub as usize);
        match (self, plane) {
            (Self::Rgb24, _) => (w * 3, h),
            (Self::Rgba, _) => (w * 4, h),
            (Self::Nv12, 1) => (w.div_ceil(2) * 2, h.div_ceil(2)),
            (_, 0) => (w, h),
            _ => (w.div_ceil(hsub), h.div_ceil(vsub)),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv420p => write!(f, "yuv420p"),
            Self::Yuv422p => write!(f, "yuv422p"),
            Self::Yuv444p => write!(f, "yuv444p"),
            Self::Nv12 => write!(f, "nv12"),
            Self::Rgb24 => write!(f, "rgb24"),
            Self::Rgba => write!(f, "rgba"),
            Self::Gray8 => write!(f, "gray8"),
        }
    }
}

bitflags! {
    /// Frame flags indicating frame properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFlags: u32 {
        /// This is a keyframe (I-frame).
        const KEYFRAME = 0x0001;
        /// Frame is corrupted or incomplete.
        const CORRUPT = 0x0002;
        /// Frame should be discarded after decoding (used for reference only).
        const DISCARD = 0x0004;
    }
}

/// A buffer for storing frame pixel data.
#[derive(Clone, PartialEq)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
    planes: Vec<PlaneData>,
}

#[derive(Clone, PartialEq)]
struct PlaneData {
    data: Vec<u8>,
    stride: usize,
}

impl FrameBuffer {
    /// Create a new zeroed frame buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let planes = (0..format.num_planes())
            .map(|plane| {
                let (stride, rows) = format.plane_geometry(plane, width, height);
                PlaneData {
                    data: vec![0u8; stride * rows],
                    stride,
                }
            })
            .collect();

        Self {
            width,
            height,
            format,
            planes,
        }
    }

    /// Get the number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Get a plane's data.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(|p| p.data.as_slice())
    }

    /// Get a mutable reference to a plane's data.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.planes.get_mut(index).map(|p| p.data.as_mut_slice())
    }

    /// Get the stride for a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.planes.get(plane).map(|p| p.stride).unwrap_or(0)
    }

    /// Get the total size of all planes in bytes.
    pub fn total_size(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("planes", &self.planes.len())
            .finish()
    }
}

/// Payload of a frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FrameData {
    /// Not yet filled.
    #[default]
    Empty,
    /// Audio samples.
    Audio(SampleBuffer),
    /// Video picture.
    Video(FrameBuffer),
}

/// A decoded audio or video frame.
#[derive(Clone, PartialEq, Default)]
pub struct Frame {
    data: FrameData,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Frame duration.
    pub duration: Duration,
    /// Frame flags.
    pub flags: FrameFlags,
    side_data: Vec<SideData>,
}

impl Frame {
    /// Create a frame with no payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an audio frame from a sample buffer.
    pub fn audio(buffer: SampleBuffer) -> Self {
        let duration = buffer.duration();
        Self {
            data: FrameData::Audio(buffer),
            duration,
            ..Self::default()
        }
    }

    /// Create a zeroed audio frame.
    pub fn new_audio(
        num_samples: usize,
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        Self::audio(SampleBuffer::new(num_samples, format, layout, sample_rate))
    }

    /// Create a video frame from a picture buffer.
    pub fn video(buffer: FrameBuffer) -> Self {
        Self {
            data: FrameData::Video(buffer),
            ..Self::default()
        }
    }

    /// Create a zeroed video frame.
    pub fn new_video(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::video(FrameBuffer::new(width, height, format))
    }

    /// Frame payload.
    pub fn data(&self) -> &FrameData {
        &self.data
    }

    /// Replace the payload, keeping timestamps and side data.
    pub fn set_data(&mut self, data: FrameData) {
        self.data = data;
    }

    /// Check if the frame carries no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self.data, FrameData::Empty)
    }

    /// Check if this is an audio frame.
    pub fn is_audio(&self) -> bool {
        matches!(self.data, FrameData::Audio(_))
    }

    /// Check if this is a video frame.
    pub fn is_video(&self) -> bool {
        matches!(self.data, FrameData::Video(_))
    }

    /// Audio samples, if this is an audio frame.
    pub fn samples(&self) -> Option<&SampleBuffer> {
        match &self.data {
            FrameData::Audio(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Mutable audio samples, if this is an audio frame.
    pub fn samples_mut(&mut self) -> Option<&mut SampleBuffer> {
        match &mut self.data {
            FrameData::Audio(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Video picture, if this is a video frame.
    pub fn picture(&self) -> Option<&FrameBuffer> {
        match &self.data {
            FrameData::Video(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Mutable video picture, if this is a video frame.
    pub fn picture_mut(&mut self) -> Option<&mut FrameBuffer> {
        match &mut self.data {
            FrameData::Video(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Number of samples per channel (zero for non-audio frames).
    pub fn num_samples(&self) -> usize {
        self.samples().map_or(0, SampleBuffer::num_samples)
    }

    /// Check if this is a keyframe.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(FrameFlags::KEYFRAME)
    }

    /// Add side data to the frame.
    pub fn add_side_data(&mut self, data: SideData) {
        self.side_data.push(data);
    }

    /// Get the first side data entry of a specific type.
    pub fn get_side_data(&self, data_type: SideDataType) -> Option<&SideData> {
        self.side_data.iter().find(|sd| sd.data_type == data_type)
    }

    /// All side data entries.
    pub fn side_data(&self) -> &[SideData] {
        &self.side_data
    }

    /// Remove every side data entry of a type, returning how many were removed.
    pub fn remove_side_data(&mut self, data_type: SideDataType) -> usize {
        let before = self.side_data.len();
        self.side_data.retain(|sd| sd.data_type != data_type);
        before - self.side_data.len()
    }

    /// Drop payload, timestamps and side data.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("data", &self.data)
            .field("pts", &self.pts)
            .field("flags", &self.flags)
            .field("side_data", &self.side_data.len())
            .finish()
    }
}

//! # avpump core
//!
//! Core types shared by every avpump component:
//! - Error handling types
//! - Audio sample buffers, formats and channel layouts
//! - Frames (audio or video) and packets, including side data
//! - Timestamps and time bases

pub mod error;
pub mod frame;
pub mod packet;
pub mod sample;
pub mod timestamp;

pub use error::{CodecError, Error, Result};
pub use frame::{Frame, FrameBuffer, FrameData, FrameFlags, PixelFormat};
pub use packet::{Packet, PacketFlags, SideData, SideDataType};
pub use sample::{ChannelLayout, SampleBuffer, SampleFormat};
pub use timestamp::{Duration, TimeBase, Timestamp};

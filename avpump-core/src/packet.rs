//! Packet abstractions for encoded media data.
//!
//! Packets contain compressed/encoded data before decoding or after encoding.
//! A drain pump keeps one packet as its receive scratch and overwrites it on
//! every receive, so callers clone anything they want to keep.

use crate::timestamp::{Duration, TimeBase, Timestamp};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Flags for packet properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u32 {
        /// This packet contains a keyframe.
        const KEYFRAME = 0x0001;
        /// Packet data is corrupted.
        const CORRUPT = 0x0002;
        /// Packet should be discarded.
        const DISCARD = 0x0004;
    }
}

/// An encoded media packet.
#[derive(Clone, PartialEq)]
pub struct Packet {
    data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Decode timestamp.
    pub dts: Timestamp,
    /// Duration of the packet.
    pub duration: Duration,
    /// Stream index this packet belongs to.
    pub stream_index: u32,
    /// Packet flags.
    pub flags: PacketFlags,
    /// Position in the input stream (bytes).
    pub pos: Option<u64>,
    side_data: Vec<SideData>,
}

impl Packet {
    /// Create a new packet with owned data.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pts: Timestamp::none(),
            dts: Timestamp::none(),
            duration: Duration::zero(),
            stream_index: 0,
            flags: PacketFlags::empty(),
            pos: None,
            side_data: Vec::new(),
        }
    }

    /// Create an empty packet.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Get the packet data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the payload vector, for engines filling the packet.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Get the size of the packet data.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if this packet is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if this is a keyframe packet.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEYFRAME)
    }

    /// Set the keyframe flag.
    pub fn set_keyframe(&mut self, keyframe: bool) {
        self.flags.set(PacketFlags::KEYFRAME, keyframe);
    }

    /// Clear payload, timestamps and side data, keeping the allocation.
    pub fn reset(&mut self) {
        self.data.clear();
        self.pts = Timestamp::none();
        self.dts = Timestamp::none();
        self.duration = Duration::zero();
        self.stream_index = 0;
        self.flags = PacketFlags::empty();
        self.pos = None;
        self.side_data.clear();
    }

    /// Add side data to the packet.
    pub fn add_side_data(&mut self, data: SideData) {
        self.side_data.push(data);
    }

    /// Get side data of a specific type.
    pub fn get_side_data(&self, data_type: SideDataType) -> Option<&SideData> {
        self.side_data.iter().find(|sd| sd.data_type == data_type)
    }

    /// All side data entries.
    pub fn side_data(&self) -> &[SideData] {
        &self.side_data
    }

    /// Rescale timestamps to a new time base.
    pub fn rescale(&mut self, target: TimeBase) {
        self.pts = self.pts.rescale(target);
        self.dts = self.dts.rescale(target);
        self.duration = self.duration.rescale(target);
    }

    /// Create a new packet with the specified timestamps.
    pub fn with_timestamps(mut self, pts: Timestamp, dts: Timestamp) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /// Create a new packet with the specified stream index.
    pub fn with_stream_index(mut self, index: u32) -> Self {
        self.stream_index = index;
        self
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("size", &self.size())
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("stream_index", &self.stream_index)
            .field("flags", &self.flags)
            .finish()
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Types of side data that can be attached to packets and frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideDataType {
    /// Codec parameter sets or extradata updates.
    ParameterSets,
    /// Display matrix (rotation/flip).
    DisplayMatrix,
    /// Skip samples (for gapless playback).
    SkipSamples,
    /// A53 closed captions.
    A53ClosedCaptions,
    /// Custom/unknown.
    Custom(u32),
}

/// Side data attached to a packet or frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideData {
    /// Type of side data.
    pub data_type: SideDataType,
    /// The side data payload.
    pub data: Vec<u8>,
}

impl SideData {
    /// Create new side data.
    pub fn new(data_type: SideDataType, data: Vec<u8>) -> Self {
        Self { data_type, data }
    }
}

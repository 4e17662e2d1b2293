//! Growable audio sample FIFO.
//!
//! Storage is a ring per plane (one plane per channel for planar formats,
//! a single interleaved plane otherwise). Read and write cursors count
//! samples monotonically; a cursor maps to a ring slot by `cursor % capacity`.

use crate::error::{ResampleError, Result};
use avpump_core::{SampleBuffer, SampleFormat};

/// First-in-first-out buffer of audio samples with a fixed format.
pub struct AudioFifo {
    format: SampleFormat,
    channels: usize,
    /// Bytes per sample slot within a plane.
    slot: usize,
    /// Capacity in samples.
    capacity: usize,
    planes: Vec<Vec<u8>>,
    read_pos: u64,
    write_pos: u64,
}

impl AudioFifo {
    /// Create a FIFO able to hold `initial_capacity` samples before growing.
    pub fn new(format: SampleFormat, channels: usize, initial_capacity: usize) -> Result<Self> {
        if channels == 0 {
            return Err(ResampleError::InvalidChannelCount { count: channels });
        }
        let capacity = initial_capacity.max(1);
        let slot = format.slot_size(channels);
        let planes = (0..format.plane_count(channels))
            .map(|_| vec![0u8; capacity * slot])
            .collect();

        Ok(Self {
            format,
            channels,
            slot,
            capacity,
            planes,
            read_pos: 0,
            write_pos: 0,
        })
    }

    /// Sample format of the buffered data.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of samples per channel currently buffered.
    pub fn size(&self) -> usize {
        (self.write_pos - self.read_pos) as usize
    }

    /// Check if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Samples that can be written before the FIFO has to grow.
    pub fn space(&self) -> usize {
        self.capacity - self.size()
    }

    /// Current capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples ever written.
    pub fn total_written(&self) -> u64 {
        self.write_pos
    }

    /// Grow the ring to hold at least `capacity` samples.
    ///
    /// Shrinking below the buffered size is ignored.
    pub fn realloc(&mut self, capacity: usize) {
        let capacity = capacity.max(self.size()).max(1);
        if capacity == self.capacity {
            return;
        }

        let size = self.size();
        let mut planes: Vec<Vec<u8>> = (0..self.planes.len())
            .map(|_| vec![0u8; capacity * self.slot])
            .collect();
        for (index, plane) in planes.iter_mut().enumerate() {
            // Relay buffered samples so each cursor lands on `cursor % capacity`.
            let mut linear = vec![0u8; size * self.slot];
            self.copy_out(index, self.read_pos, &mut linear);
            ring_write(plane, capacity, self.slot, self.read_pos, &linear);
        }

        self.planes = planes;
        self.capacity = capacity;
    }

    /// Append `nb_samples` samples from `planes`, growing if needed.
    pub fn write<P: AsRef<[u8]>>(&mut self, planes: &[P], nb_samples: usize) -> Result<usize> {
        self.check_planes(planes.len())?;
        let bytes = nb_samples * self.slot;
        for plane in planes {
            let len = plane.as_ref().len();
            if len < bytes {
                return Err(ResampleError::mismatch(
                    format!("at least {bytes} bytes per plane"),
                    format!("{len} bytes"),
                ));
            }
        }

        if nb_samples > self.space() {
            let needed = self.size() + nb_samples;
            self.realloc(needed.max(self.capacity * 2));
        }

        for (index, plane) in planes.iter().enumerate() {
            ring_write(
                &mut self.planes[index],
                self.capacity,
                self.slot,
                self.write_pos,
                &plane.as_ref()[..bytes],
            );
        }
        self.write_pos += nb_samples as u64;
        Ok(nb_samples)
    }

    /// Copy up to `nb_samples` from the front without consuming them.
    pub fn peek<P: AsMut<[u8]>>(&self, planes: &mut [P], nb_samples: usize) -> Result<usize> {
        self.peek_at(planes, nb_samples, 0)
    }

    /// Copy up to `nb_samples` starting `offset` samples past the front.
    pub fn peek_at<P: AsMut<[u8]>>(
        &self,
        planes: &mut [P],
        nb_samples: usize,
        offset: usize,
    ) -> Result<usize> {
        self.check_planes(planes.len())?;
        let count = nb_samples.min(self.size().saturating_sub(offset));
        let bytes = count * self.slot;
        for (index, plane) in planes.iter_mut().enumerate() {
            let plane = plane.as_mut();
            if plane.len() < bytes {
                return Err(ResampleError::mismatch(
                    format!("at least {bytes} bytes per plane"),
                    format!("{} bytes", plane.len()),
                ));
            }
            self.copy_out(index, self.read_pos + offset as u64, &mut plane[..bytes]);
        }
        Ok(count)
    }

    /// Move up to `nb_samples` from the front into `planes`.
    pub fn read<P: AsMut<[u8]>>(&mut self, planes: &mut [P], nb_samples: usize) -> Result<usize> {
        let count = self.peek(planes, nb_samples)?;
        self.read_pos += count as u64;
        Ok(count)
    }

    /// Move exactly `nb_samples` into `buffer`, resizing it to match.
    pub fn read_buffer(&mut self, buffer: &mut SampleBuffer, nb_samples: usize) -> Result<usize> {
        self.check_params(buffer)?;
        if nb_samples > self.size() {
            return Err(ResampleError::InsufficientSamples {
                needed: nb_samples,
                available: self.size(),
            });
        }
        buffer.set_num_samples(nb_samples);
        self.read(buffer.planes_mut(), nb_samples)
    }

    /// Discard up to `nb_samples` from the front.
    pub fn drain(&mut self, nb_samples: usize) -> usize {
        let count = nb_samples.min(self.size());
        self.read_pos += count as u64;
        count
    }

    /// Discard everything buffered.
    pub fn reset(&mut self) {
        self.read_pos = self.write_pos;
    }

    fn check_planes(&self, count: usize) -> Result<()> {
        if count != self.planes.len() {
            return Err(ResampleError::mismatch(
                format!("{} planes", self.planes.len()),
                format!("{count} planes"),
            ));
        }
        Ok(())
    }

    fn check_params(&self, buffer: &SampleBuffer) -> Result<()> {
        if buffer.format != self.format || buffer.channels() != self.channels {
            return Err(ResampleError::mismatch(
                format!("{}x{}", self.format, self.channels),
                format!("{}x{}", buffer.format, buffer.channels()),
            ));
        }
        Ok(())
    }

    fn copy_out(&self, plane: usize, cursor: u64, dst: &mut [u8]) {
        let ring = &self.planes[plane];
        let start = (cursor % self.capacity as u64) as usize * self.slot;
        let first = dst.len().min(ring.len() - start);
        dst[..first].copy_from_slice(&ring[start..start + first]);
        let rest = dst.len() - first;
        dst[first..].copy_from_slice(&ring[..rest]);
    }
}

fn ring_write(ring: &mut [u8], capacity: usize, slot: usize, cursor: u64, src: &[u8]) {
    let start = (cursor % capacity as u64) as usize * slot;
    let first = src.len().min(ring.len() - start);
    ring[start..start + first].copy_from_slice(&src[..first]);
    let rest = src.len() - first;
    ring[..rest].copy_from_slice(&src[first..]);
}

impl std::fmt::Debug for AudioFifo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFifo")
            .field("format", &self.format)
            .field("channels", &self.channels)
            .field("size", &self.size())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_s16(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn to_i16(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_fifo_creation() {
        let fifo = AudioFifo::new(SampleFormat::S16, 2, 64).unwrap();
        assert_eq!(fifo.size(), 0);
        assert_eq!(fifo.space(), 64);
        assert!(AudioFifo::new(SampleFormat::S16, 0, 64).is_err());
    }

    #[test]
    fn test_write_read_order() {
        let mut fifo = AudioFifo::new(SampleFormat::S16, 1, 8).unwrap();
        fifo.write(&[mono_s16(&[1, 2, 3, 4, 5])], 5).unwrap();

        let mut out = [vec![0u8; 6]];
        assert_eq!(fifo.read(&mut out, 3).unwrap(), 3);
        assert_eq!(to_i16(&out[0]), vec![1, 2, 3]);
        assert_eq!(fifo.size(), 2);
    }

    #[test]
    fn test_wraparound() {
        let mut fifo = AudioFifo::new(SampleFormat::S16, 1, 4).unwrap();
        fifo.write(&[mono_s16(&[1, 2, 3])], 3).unwrap();
        fifo.drain(2);
        fifo.write(&[mono_s16(&[4, 5, 6])], 3).unwrap();
        assert_eq!(fifo.capacity(), 4);

        let mut out = [vec![0u8; 8]];
        assert_eq!(fifo.read(&mut out, 4).unwrap(), 4);
        assert_eq!(to_i16(&out[0]), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_grows_preserving_wrapped_content() {
        let mut fifo = AudioFifo::new(SampleFormat::S16, 1, 4).unwrap();
        fifo.write(&[mono_s16(&[1, 2, 3, 4])], 4).unwrap();
        fifo.drain(3);
        fifo.write(&[mono_s16(&[5, 6])], 2).unwrap();
        // Content now wraps; growing must keep order.
        fifo.write(&[mono_s16(&[7, 8, 9, 10, 11])], 5).unwrap();
        assert!(fifo.capacity() >= 8);
        assert_eq!(fifo.size(), 8);

        let mut out = [vec![0u8; 16]];
        fifo.read(&mut out, 8).unwrap();
        assert_eq!(to_i16(&out[0]), vec![4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_planar_channels_stay_separate() {
        let mut fifo = AudioFifo::new(SampleFormat::S16p, 2, 4).unwrap();
        fifo.write(&[mono_s16(&[1, 2]), mono_s16(&[-1, -2])], 2).unwrap();

        let mut out = [vec![0u8; 4], vec![0u8; 4]];
        fifo.read(&mut out, 2).unwrap();
        assert_eq!(to_i16(&out[0]), vec![1, 2]);
        assert_eq!(to_i16(&out[1]), vec![-1, -2]);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut fifo = AudioFifo::new(SampleFormat::S16, 1, 8).unwrap();
        fifo.write(&[mono_s16(&[9, 8, 7])], 3).unwrap();

        let mut out = [vec![0u8; 2]];
        fifo.peek_at(&mut out, 1, 1).unwrap();
        assert_eq!(to_i16(&out[0]), vec![8]);
        assert_eq!(fifo.size(), 3);
    }

    #[test]
    fn test_pop_decreases_size_exactly() {
        let mut fifo = AudioFifo::new(SampleFormat::F32, 2, 16).unwrap();
        fifo.write(&[vec![0u8; 40 * 8]], 40).unwrap();
        let mut buffer =
            SampleBuffer::new(0, SampleFormat::F32, avpump_core::ChannelLayout::Stereo, 48000);
        fifo.read_buffer(&mut buffer, 13).unwrap();
        assert_eq!(fifo.size(), 27);
        assert_eq!(buffer.num_samples(), 13);
        assert!(fifo.read_buffer(&mut buffer, 28).is_err());
        assert_eq!(fifo.size(), 27);
    }

    #[test]
    fn test_plane_count_mismatch() {
        let mut fifo = AudioFifo::new(SampleFormat::S16p, 2, 4).unwrap();
        assert!(fifo.write(&[mono_s16(&[1])], 1).is_err());
    }

    #[test]
    fn test_short_plane_rejected() {
        let mut fifo = AudioFifo::new(SampleFormat::S16, 1, 4).unwrap();
        assert!(fifo.write(&[mono_s16(&[1])], 2).is_err());
        assert_eq!(fifo.size(), 0);
    }

    #[test]
    fn test_reset() {
        let mut fifo = AudioFifo::new(SampleFormat::U8, 1, 4).unwrap();
        fifo.write(&[vec![1u8; 3]], 3).unwrap();
        fifo.reset();
        assert!(fifo.is_empty());
        assert_eq!(fifo.total_written(), 3);
    }
}

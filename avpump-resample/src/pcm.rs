//! Conversion between stored sample bytes and normalized `f64` values.
//!
//! Every supported format round-trips through `f64` without loss, so the
//! context can do all remixing and interpolation in one representation.

use avpump_core::{SampleBuffer, SampleFormat};

/// Decode one sample starting at `bytes[0]`.
#[inline]
pub fn read_sample(format: SampleFormat, bytes: &[u8]) -> f64 {
    match format.to_packed() {
        SampleFormat::U8 => (f64::from(bytes[0]) - 128.0) / 128.0,
        SampleFormat::S16 => f64::from(i16::from_ne_bytes([bytes[0], bytes[1]])) / 32768.0,
        SampleFormat::S32 => {
            f64::from(i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])) / 2147483648.0
        }
        SampleFormat::F32 => {
            f64::from(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        _ => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            f64::from_ne_bytes(raw)
        }
    }
}

/// Encode one sample into `bytes`, clipping integer formats.
#[inline]
pub fn write_sample(format: SampleFormat, value: f64, bytes: &mut [u8]) {
    match format.to_packed() {
        SampleFormat::U8 => {
            bytes[0] = (value * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16 => {
            let v = (value * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            bytes[..2].copy_from_slice(&v.to_ne_bytes());
        }
        SampleFormat::S32 => {
            let v = (value * 2147483648.0)
                .round()
                .clamp(-2147483648.0, 2147483647.0) as i32;
            bytes[..4].copy_from_slice(&v.to_ne_bytes());
        }
        SampleFormat::F32 => bytes[..4].copy_from_slice(&(value as f32).to_ne_bytes()),
        _ => bytes[..8].copy_from_slice(&value.to_ne_bytes()),
    }
}

/// Decode `buffer` into one `f64` vector per channel.
pub fn decode_channels(buffer: &SampleBuffer) -> Vec<Vec<f64>> {
    let format = buffer.format;
    let channels = buffer.channels();
    let bps = format.bytes_per_sample();
    let count = buffer.num_samples();

    if format.is_planar() {
        buffer
            .planes()
            .iter()
            .map(|plane| {
                plane[..count * bps]
                    .chunks_exact(bps)
                    .map(|b| read_sample(format, b))
                    .collect()
            })
            .collect()
    } else {
        let data = buffer.data();
        (0..channels)
            .map(|ch| {
                (0..count)
                    .map(|i| read_sample(format, &data[(i * channels + ch) * bps..]))
                    .collect()
            })
            .collect()
    }
}

/// Encode `count` samples from each channel vector into the start of `buffer`.
///
/// `buffer` must hold at least `count` samples and `channels.len()` must match
/// its layout.
pub fn encode_channels<I>(buffer: &mut SampleBuffer, channels: &mut [I], count: usize)
where
    I: Iterator<Item = f64>,
{
    let format = buffer.format;
    let bps = format.bytes_per_sample();
    let stride = channels.len();

    if format.is_planar() {
        for (plane, source) in buffer.planes_mut().iter_mut().zip(channels.iter_mut()) {
            for (slot, value) in plane.chunks_exact_mut(bps).take(count).zip(source) {
                write_sample(format, value, slot);
            }
        }
    } else {
        let data = buffer.data_mut();
        for (ch, source) in channels.iter_mut().enumerate() {
            for (i, value) in source.take(count).enumerate() {
                let offset = (i * stride + ch) * bps;
                write_sample(format, value, &mut data[offset..offset + bps]);
            }
        }
    }
}

//! Integration tests for avpump-resample.

use avpump_core::{ChannelLayout, Frame, SampleBuffer, SampleFormat};
use avpump_resample::{AudioFifo, AudioRebuffer, ResampleError};
use proptest::prelude::*;

/// Mono S16 frame whose samples count up from `start`.
fn counting_frame(start: usize, count: usize, rate: u32) -> Frame {
    let mut buffer = SampleBuffer::new(count, SampleFormat::S16, ChannelLayout::Mono, rate);
    for (i, slot) in buffer.data_mut().chunks_exact_mut(2).enumerate() {
        let value = ((start + i) % 30000) as i16;
        slot.copy_from_slice(&value.to_ne_bytes());
    }
    Frame::audio(buffer)
}

fn s16_values(frame: &Frame) -> Vec<i16> {
    frame
        .samples()
        .unwrap()
        .data()
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect()
}

// ============================================================================
// Rebuffer Tests
// ============================================================================

#[test]
fn test_identity_rebuffer_preserves_sample_order() {
    let mut rebuffer =
        AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 160, 8000).unwrap();
    let mut out = Vec::new();
    let mut fed = 0;

    for chunk in [100, 37, 400, 1, 222] {
        let frames = rebuffer
            .convert(Some(&counting_frame(fed, chunk, 8000)))
            .unwrap()
            .collect_owned()
            .unwrap();
        fed += chunk;
        for frame in &frames {
            out.extend(s16_values(frame));
        }
    }
    rebuffer.flush().unwrap().collect_owned().unwrap();
    if let Some(tail) = rebuffer.drain_remainder().unwrap() {
        out.extend(s16_values(tail));
    }

    let expected: Vec<i16> = (0..fed).map(|i| i as i16).collect();
    assert_eq!(out, expected);
}

#[test]
fn test_interleaved_stereo_to_planar_float() {
    let mut rebuffer =
        AudioRebuffer::new(SampleFormat::F32p, ChannelLayout::Stereo, 2, 48000).unwrap();

    let mut buffer = SampleBuffer::new(2, SampleFormat::S16, ChannelLayout::Stereo, 48000);
    for (i, v) in [16384i16, -16384, 8192, -8192].iter().enumerate() {
        buffer.data_mut()[i * 2..i * 2 + 2].copy_from_slice(&v.to_ne_bytes());
    }

    let frames = rebuffer.convert(Some(&Frame::audio(buffer))).unwrap().collect_owned().unwrap();
    assert_eq!(frames.len(), 1);

    let planes = frames[0].samples().unwrap().planes();
    let left: Vec<f32> = planes[0]
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let right: Vec<f32> = planes[1]
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(left, vec![0.5, 0.25]);
    assert_eq!(right, vec![-0.5, -0.25]);
}

#[test]
fn test_resampled_total_after_flush() {
    let mut rebuffer =
        AudioRebuffer::new(SampleFormat::F32, ChannelLayout::Mono, 1024, 48000).unwrap();
    let mut popped = 0;

    for _ in 0..10 {
        let frames = rebuffer
            .convert(Some(&counting_frame(0, 441, 44100)))
            .unwrap()
            .collect_owned()
            .unwrap();
        popped += frames.len() * 1024;
    }
    popped += rebuffer.flush().unwrap().collect_owned().unwrap().len() * 1024;

    // 4410 samples at 44.1kHz are 4800 at 48kHz.
    assert_eq!(popped + rebuffer.size(), 4800);
    assert_eq!(rebuffer.delay(), 0);
}

#[test]
fn test_reset_restarts_timestamps() {
    let mut rebuffer =
        AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 100, 8000).unwrap();
    rebuffer.convert(Some(&counting_frame(0, 250, 8000))).unwrap().collect_owned().unwrap();
    rebuffer.reset();
    assert_eq!(rebuffer.size(), 0);

    let frames = rebuffer
        .convert(Some(&counting_frame(0, 100, 8000)))
        .unwrap()
        .collect_owned()
        .unwrap();
    assert_eq!(frames[0].pts.value, 0);
}

#[test]
fn test_errors_convert_to_core_errors() {
    let mut rebuffer =
        AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, 100, 8000).unwrap();
    rebuffer.push(Some(&counting_frame(0, 10, 8000))).unwrap();

    let err: avpump_core::Error =
        rebuffer.push(Some(&counting_frame(0, 10, 16000))).unwrap_err().into();
    assert!(err.is_configuration());

    let err: avpump_core::Error = rebuffer.pop().unwrap_err().into();
    assert!(matches!(err, avpump_core::Error::InvalidParameter(_)));
}

// ============================================================================
// FIFO Tests
// ============================================================================

#[test]
fn test_fifo_rejects_plane_mismatch() {
    let mut fifo = AudioFifo::new(SampleFormat::F32p, 2, 16).unwrap();
    let one_plane = vec![vec![0u8; 16]];
    assert!(matches!(
        fifo.write(&one_plane, 4),
        Err(ResampleError::BufferMismatch { .. })
    ));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Every pushed sample is either handed out in a full frame or still buffered,
    /// and no full frame is left behind after a convert.
    #[test]
    fn identity_conserves_samples(
        dst_nb in 1usize..512,
        chunks in prop::collection::vec(0usize..2000, 1..20),
    ) {
        let mut rebuffer =
            AudioRebuffer::new(SampleFormat::S16, ChannelLayout::Mono, dst_nb, 44100).unwrap();
        let mut fed = 0;
        let mut popped = 0;

        for chunk in chunks {
            let frames = rebuffer
                .convert(Some(&counting_frame(fed, chunk, 44100)))
                .unwrap()
                .collect_owned()
                .unwrap();
            fed += chunk;
            for frame in &frames {
                prop_assert_eq!(frame.num_samples(), dst_nb);
                prop_assert_eq!(frame.pts.value, popped as i64);
                popped += dst_nb;
            }
            prop_assert!(rebuffer.size() < dst_nb);
            prop_assert_eq!(popped + rebuffer.size(), fed);
        }
    }

    /// FIFO reads return written bytes in order regardless of chunking.
    #[test]
    fn fifo_preserves_order(
        writes in prop::collection::vec(1usize..300, 1..30),
        read_size in 1usize..200,
    ) {
        let mut fifo = AudioFifo::new(SampleFormat::U8, 1, 1).unwrap();
        let mut expected = Vec::new();
        let mut actual = Vec::new();
        let mut next = 0u8;

        for count in writes {
            let data: Vec<u8> = (0..count).map(|_| { next = next.wrapping_add(1); next }).collect();
            expected.extend_from_slice(&data);
            fifo.write(&[data], count).unwrap();

            while fifo.size() >= read_size {
                let mut out = vec![vec![0u8; read_size]];
                fifo.read(&mut out, read_size).unwrap();
                actual.extend(out.remove(0));
            }
        }
        let rest = fifo.size();
        let mut out = vec![vec![0u8; rest]];
        fifo.read(&mut out, rest).unwrap();
        actual.extend(out.remove(0));

        prop_assert_eq!(actual, expected);
    }

    /// Rate conversion emits ceil(n * out / in) samples once flushed.
    #[test]
    fn resampled_count_matches_ratio(
        src_rate in prop::sample::select(vec![8000u32, 22050, 44100, 48000]),
        dst_rate in prop::sample::select(vec![8000u32, 16000, 44100, 48000]),
        total in 1usize..5000,
    ) {
        let mut rebuffer =
            AudioRebuffer::new(SampleFormat::F32, ChannelLayout::Mono, 64, dst_rate).unwrap();
        let mut produced = 0;

        produced += rebuffer
            .convert(Some(&counting_frame(0, total, src_rate)))
            .unwrap()
            .collect_owned()
            .unwrap()
            .len()
            * 64;
        produced += rebuffer.flush().unwrap().collect_owned().unwrap().len() * 64;
        produced += rebuffer.size();

        let expected = (total as u64 * u64::from(dst_rate)).div_ceil(u64::from(src_rate)) as usize;
        prop_assert_eq!(produced, expected);
    }
}

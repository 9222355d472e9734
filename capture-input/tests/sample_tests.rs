// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Sample construction, field splitting and texel burn-in.

use std::time::Duration;

use capture_input::{
    AudioSample, Field, SampleFormat, SamplePool, Timecode, VideoFrameDesc, VideoSample,
    burn_in::{self, EncodePixelFormat},
};
use capture_sdk::{FrameRate, PixelFormat};

/// A frame whose line `n` is filled with byte `n`.
fn numbered_lines(pitch: u32, height: u32) -> Vec<u8> {
    (0..height)
        .flat_map(|line| std::iter::repeat_n(line as u8, pitch as usize))
        .collect()
}

fn desc(pitch: u32, width: u32, height: u32) -> VideoFrameDesc {
    VideoFrameDesc {
        pitch,
        width,
        height,
        format: SampleFormat::CharUyvy,
        time: Duration::from_millis(40),
        frame_rate: FrameRate::new(25, 1),
        timecode: Some(Timecode::new(0, 0, 1, 0, false)),
        srgb: true,
    }
}

#[test]
fn progressive_copy_keeps_geometry() {
    let source = numbered_lines(16, 4);
    let mut sample = VideoSample::default();
    sample.initialize(&source, &desc(16, 8, 4)).unwrap();

    assert_eq!(sample.buffer(), source.as_slice());
    assert_eq!(sample.height(), 4);
    assert_eq!(sample.stride(), 16);
    assert_eq!(sample.field(), Field::Progressive);
    assert_eq!(sample.duration(), Duration::from_millis(40));
    assert!(sample.is_srgb());
}

#[test]
fn fields_take_alternate_lines() {
    let source = numbered_lines(4, 6);
    let desc = desc(4, 2, 6);

    let mut even = VideoSample::default();
    even.initialize_field(Field::Even, &source, &desc).unwrap();
    let mut odd = VideoSample::default();
    odd.initialize_field(Field::Odd, &source, &desc).unwrap();

    let lines = |sample: &VideoSample| -> Vec<u8> {
        sample.buffer().chunks_exact(4).map(|row| row[0]).collect()
    };
    assert_eq!(lines(&even), vec![0, 2, 4]);
    assert_eq!(lines(&odd), vec![1, 3, 5]);
    assert_eq!(even.height(), 3);
    assert_eq!(odd.field(), Field::Odd);
}

#[test]
fn short_video_buffer_is_rejected() {
    let mut sample = VideoSample::default();
    assert!(sample.initialize(&[0u8; 10], &desc(4, 2, 4)).is_err());
    assert!(sample.initialize(&[], &desc(0, 0, 0)).is_err());
}

#[test]
fn audio_counts_four_byte_samples() {
    let bytes: Vec<u8> = (0..6i32).flat_map(|s| s.to_le_bytes()).chain([0xff, 0xff]).collect();
    let mut sample = AudioSample::default();
    sample
        .initialize(&bytes, 2, 48_000, Duration::from_secs(1), None)
        .unwrap();

    assert_eq!(sample.sample_count(), 6);
    assert_eq!(sample.frames(), 3);
    assert_eq!(sample.buffer(), &[0, 1, 2, 3, 4, 5]);
    assert_eq!(sample.bits_per_sample(), 32);
    assert_eq!(sample.duration(), Duration::from_nanos(62_500));
}

#[test]
fn audio_without_channels_is_rejected() {
    let mut sample = AudioSample::default();
    assert!(sample.initialize(&[0u8; 8], 0, 48_000, Duration::ZERO, None).is_err());
    assert!(sample.initialize(&[0u8; 8], 2, 0, Duration::ZERO, None).is_err());
}

#[test]
fn pool_reuses_storage() {
    let pool = SamplePool::<AudioSample>::new();
    let mut first = pool.acquire();
    first
        .initialize(&[1, 0, 0, 0], 1, 48_000, Duration::ZERO, None)
        .unwrap();
    drop(first);
    assert_eq!(pool.available(), 1);

    let second = pool.acquire();
    assert_eq!(pool.available(), 0);
    assert_eq!(second.sample_count(), 0);

    let owned = second.into_inner();
    assert_eq!(owned.channels(), 0);
    assert_eq!(pool.available(), 0);
}

#[test]
fn burn_in_round_trips_in_both_packings() {
    let timecode = Timecode::new(12, 34, 56, 23, false);
    for (pixel_format, encode) in [
        (PixelFormat::Yuv8Bit, EncodePixelFormat::CharUyvy),
        (PixelFormat::Yuv10Bit, EncodePixelFormat::YuvV210),
    ] {
        let width = 1920;
        let height = 8;
        let pitch = pixel_format.row_bytes(width);
        let mut picture = vec![0u8; (pitch * height) as usize];

        assert!(burn_in::encode_timecode(encode, &mut picture, pitch, width, height, &timecode));
        assert_eq!(
            burn_in::read_timecode(encode, &picture, pitch, width, height),
            Some(timecode)
        );
    }
}

#[test]
fn burn_in_skips_small_pictures() {
    let mut picture = vec![7u8; 64 * 4];
    let timecode = Timecode::new(1, 0, 0, 0, false);
    assert!(!burn_in::encode_timecode(
        EncodePixelFormat::CharUyvy,
        &mut picture,
        64,
        32,
        4,
        &timecode
    ));
    assert!(picture.iter().all(|&b| b == 7));
}

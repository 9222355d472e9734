// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Frame decoding: timing, field doubling, admission and signal monitoring.
//!
//! Decoders run on the test thread with a [`ManualClock`], so every timing
//! assertion is exact.

use std::{sync::Arc, time::Duration};

use capture_input::{
    CaptureState, DecodeOutcome, DecoderSettings, Field, FrameDecoder, ManualClock,
    SampleBuffer, SampleFormat, Timecode,
    burn_in::{self, EncodePixelFormat},
};
use capture_sdk::{FieldDominance, FrameRate, PixelFormat, SyntheticFrame};
use tracing_test::traced_test;

fn decoder_with(clock: &ManualClock, configure: impl FnOnce(&mut DecoderSettings)) -> FrameDecoder {
    let mut settings = DecoderSettings {
        url: "capture://test".to_string(),
        clock: Arc::new(clock.clone()),
        ..Default::default()
    };
    configure(&mut settings);
    FrameDecoder::new(settings)
}

fn decode(
    decoder: &mut FrameDecoder,
    frame: &mut SyntheticFrame,
    samples: &SampleBuffer,
) -> DecodeOutcome {
    decoder.decode(&mut frame.info(), CaptureState::Playing, samples)
}

fn interlaced_frame() -> SyntheticFrame {
    let mut frame =
        SyntheticFrame::video(16, 8, PixelFormat::Yuv8Bit, FieldDominance::Interlaced, 0);
    let pitch = frame.pitch as usize;
    if let Some(video) = frame.video.as_mut() {
        for (line, row) in video.chunks_exact_mut(pitch).enumerate() {
            row.fill(line as u8);
        }
    }
    frame
}

#[test]
fn interlaced_frame_yields_two_fields() {
    let clock = ManualClock::starting_at(Duration::from_secs(10));
    let mut decoder = decoder_with(&clock, |s| s.frame_rate = FrameRate::new(50, 1));
    let samples = SampleBuffer::default();

    let mut frame = interlaced_frame().with_timecode(10, 0, 0, 10);
    let outcome = decode(&mut decoder, &mut frame, &samples);
    let DecodeOutcome::Decoded(stats) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(stats.video_queued, 2);
    assert_eq!(samples.video().len(), 2);

    let even = samples.video().pop().unwrap();
    let odd = samples.video().pop().unwrap();
    assert_eq!(even.field(), Field::Even);
    assert_eq!(odd.field(), Field::Odd);
    assert_eq!(odd.time() - even.time(), Duration::from_millis(20));
    assert_eq!(even.time(), Duration::from_secs(10));
    assert_eq!(even.timecode().unwrap().frames, 10);
    assert_eq!(odd.timecode().unwrap().frames, 11);
    assert_eq!(even.height(), 4);
    assert_eq!(even.buffer()[0], 0);
    assert_eq!(odd.buffer()[0], 1);
}

#[test]
fn progressive_frame_yields_one_picture() {
    let clock = ManualClock::starting_at(Duration::from_secs(3));
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(16, 4, PixelFormat::Yuv10Bit, FieldDominance::Progressive, 9);
    decode(&mut decoder, &mut frame, &samples);

    let picture = samples.video().pop().unwrap();
    assert_eq!(picture.field(), Field::Progressive);
    assert_eq!(picture.format(), SampleFormat::YuvV210);
    assert_eq!(picture.height(), 4);
    assert_eq!(picture.time(), Duration::from_secs(3));
    assert!(picture.timecode().is_none());
    assert!(samples.video().is_empty());
}

#[test]
fn unknown_pixel_format_is_queued_as_bgra() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(8, 2, PixelFormat::Other(7), FieldDominance::Progressive, 1);
    decode(&mut decoder, &mut frame, &samples);
    assert_eq!(samples.video().pop().unwrap().format(), SampleFormat::CharBgra);
}

#[test]
fn no_signal_fails_only_after_grace_period() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();
    let mut heartbeat = SyntheticFrame::no_signal();

    assert_eq!(decode(&mut decoder, &mut heartbeat, &samples), DecodeOutcome::AwaitingSignal);
    clock.advance(Duration::from_millis(1999));
    assert_eq!(decode(&mut decoder, &mut heartbeat, &samples), DecodeOutcome::AwaitingSignal);
    clock.advance(Duration::from_millis(1));
    assert_eq!(decode(&mut decoder, &mut heartbeat, &samples), DecodeOutcome::AwaitingSignal);
    clock.advance(Duration::from_millis(1));
    assert_eq!(decode(&mut decoder, &mut heartbeat, &samples), DecodeOutcome::SignalLost);
}

#[test]
fn signal_loss_after_a_frame_fails_immediately() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(8, 2, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0);
    decode(&mut decoder, &mut frame, &samples);
    assert!(decoder.received_valid_frame());

    let mut heartbeat = SyntheticFrame::no_signal();
    assert_eq!(decode(&mut decoder, &mut heartbeat, &samples), DecodeOutcome::SignalLost);
}

#[test]
fn audio_only_events_are_not_heartbeats() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();

    clock.advance(Duration::from_secs(5));
    let mut frame = SyntheticFrame::audio_only(2, 48_000, 10);
    assert!(matches!(decode(&mut decoder, &mut frame, &samples), DecodeOutcome::Decoded(_)));
    assert!(!decoder.received_valid_frame());
}

#[test]
fn frames_are_ignored_until_playing() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(8, 2, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0);
    let outcome = decoder.decode(&mut frame.info(), CaptureState::Preparing, &samples);
    assert_eq!(outcome, DecodeOutcome::Ignored);
    assert!(samples.video().is_empty());
    assert!(decoder.received_valid_frame());
}

#[test]
fn audio_is_tagged_and_tracked() {
    let clock = ManualClock::starting_at(Duration::from_millis(500));
    let mut decoder = decoder_with(&clock, |_| {});
    let samples = SampleBuffer::default();

    let mut frame = SyntheticFrame::audio_only(8, 48_000, 100).with_timecode(0, 0, 1, 2);
    decode(&mut decoder, &mut frame, &samples);

    let audio = samples.audio().pop().unwrap();
    assert_eq!(audio.sample_count(), 800);
    assert_eq!(audio.channels(), 8);
    assert_eq!(audio.sample_rate(), 48_000);
    assert_eq!(audio.time(), Duration::from_millis(500));
    assert_eq!(audio.timecode(), Some(Timecode::new(0, 0, 1, 2, false)));

    let format = decoder.audio_track_format();
    assert_eq!(format.bits_per_sample, 32);
    assert_eq!(format.channels, 8);
    assert_eq!(format.sample_rate, 48_000);
}

#[test]
fn full_audio_queue_drops_and_counts_when_verifying() {
    let clock = ManualClock::default();
    let samples = SampleBuffer::new(1, 1);
    let mut counting = decoder_with(&clock, |s| s.verify_drop_count = true);

    for _ in 0..3 {
        decode(&mut counting, &mut SyntheticFrame::audio_only(2, 48_000, 4), &samples);
    }
    assert_eq!(samples.audio().len(), 2);
    assert_eq!(samples.audio().take_drops(), 1);

    let mut silent = decoder_with(&clock, |_| {});
    let outcome = decode(&mut silent, &mut SyntheticFrame::audio_only(2, 48_000, 4), &samples);
    let DecodeOutcome::Decoded(stats) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(stats.audio_dropped, 1);
    assert_eq!(samples.audio().take_drops(), 0);
}

#[test]
fn interlaced_admission_reserves_the_odd_field() {
    let clock = ManualClock::default();
    let samples = SampleBuffer::new(2, 2);
    let mut decoder = decoder_with(&clock, |s| s.verify_drop_count = true);

    for _ in 0..3 {
        decode(&mut decoder, &mut interlaced_frame(), &samples);
        assert!(samples.video().len() <= samples.video().hard_capacity());
    }
    assert_eq!(samples.video().len(), 4);
    assert_eq!(samples.video().take_drops(), 1);
}

#[test]
fn timecode_drives_time_when_synchronized() {
    let clock = ManualClock::starting_at(Duration::from_secs(99));
    let mut decoder = decoder_with(&clock, |s| {
        s.frame_rate = FrameRate::new(25, 1);
        s.use_time_synchronization = true;
    });
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(8, 2, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0)
            .with_timecode(0, 0, 1, 5);
    decode(&mut decoder, &mut frame, &samples);

    assert_eq!(samples.video().pop().unwrap().time(), Duration::from_millis(1200));
    let (timecode, timespan) = decoder.last_timecode().unwrap();
    assert_eq!(timecode, Timecode::new(0, 0, 1, 5, false));
    assert_eq!(timespan, Duration::from_millis(1200));
}

#[test]
fn burn_in_marks_progressive_pictures() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |s| s.encode_timecode_in_texel = true);
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(256, 8, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0)
            .with_timecode(1, 2, 3, 4);
    decode(&mut decoder, &mut frame, &samples);

    let picture = samples.video().pop().unwrap();
    let strip = burn_in::read_timecode(
        EncodePixelFormat::CharUyvy,
        picture.buffer(),
        picture.stride(),
        picture.width(),
        picture.height(),
    );
    assert_eq!(strip, Some(Timecode::new(1, 2, 3, 4, false)));
}

#[test]
fn burn_in_leaves_interlaced_pictures_alone() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |s| s.encode_timecode_in_texel = true);
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(256, 16, PixelFormat::Yuv8Bit, FieldDominance::Interlaced, 0x55)
            .with_timecode(1, 2, 3, 4);
    decode(&mut decoder, &mut frame, &samples);

    assert_eq!(samples.video().len(), 2);
    assert!(frame.video.unwrap().iter().all(|&b| b == 0x55));
}

#[test]
#[traced_test]
fn out_of_range_timecode_is_a_warning() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |s| s.frame_rate = FrameRate::new(25, 1));
    let samples = SampleBuffer::default();

    let mut frame =
        SyntheticFrame::video(8, 2, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0)
            .with_timecode(0, 0, 0, 27);
    decode(&mut decoder, &mut frame, &samples);

    assert!(logs_contain("exceeds 25 frames per second"));
    assert_eq!(samples.video().pop().unwrap().timecode().unwrap().frames, 27);
}

#[test]
#[traced_test]
fn interlaced_frame_with_maximal_frame_number_still_decodes() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |s| s.frame_rate = FrameRate::new(50, 1));
    let samples = SampleBuffer::default();

    let mut frame = interlaced_frame().with_timecode(0, 0, 0, u32::MAX);
    let outcome = decode(&mut decoder, &mut frame, &samples);

    assert!(matches!(outcome, DecodeOutcome::Decoded(stats) if stats.video_queued == 2));
    assert!(logs_contain("exceeds 49 frames per second"));
    let even = samples.video().pop().unwrap();
    let odd = samples.video().pop().unwrap();
    assert_eq!(even.timecode().unwrap().frames, u32::MAX);
    assert_eq!(odd.timecode().unwrap().frames, u32::MAX);
}

#[test]
#[traced_test]
fn missing_timecode_warns_once() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |s| s.timecode_expected = true);
    let samples = SampleBuffer::default();

    for _ in 0..3 {
        let mut frame =
            SyntheticFrame::video(8, 2, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0);
        decode(&mut decoder, &mut frame, &samples);
    }

    logs_assert(|lines: &[&str]| {
        match lines.iter().filter(|line| line.contains("without a timecode")).count() {
            1 => Ok(()),
            n => Err(format!("expected one warning, found {n}")),
        }
    });
}

#[test]
#[traced_test]
fn timecode_logging_reports_each_frame() {
    let clock = ManualClock::default();
    let mut decoder = decoder_with(&clock, |s| s.log_timecode = true);
    let samples = SampleBuffer::default();

    let mut frame = SyntheticFrame::audio_only(2, 48_000, 4).with_timecode(10, 0, 0, 12);
    decode(&mut decoder, &mut frame, &samples);

    assert!(logs_contain("Timecode 10:00:00:12"));
}

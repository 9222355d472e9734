// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Tick behaviour and drop telemetry of [`CapturePlayer`].

use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use capture_input::{CaptureState, Clock, ManualClock, MediaEvent};
use capture_sdk::{FieldDominance, PixelFormat, SyntheticFrame, VirtualSdk};
use tracing_test::traced_test;

use super::CapturePlayer;
use crate::{MediaOptions, RecordingEventSink, keys};

const URL: &str = "capture://0";

type Fixture = (CapturePlayer, Arc<VirtualSdk>, Arc<RecordingEventSink>);

fn player_with_depth(depth: i64, log_drops: bool) -> Fixture {
    player_with_clock(depth, log_drops, Arc::new(ManualClock::default()))
}

fn player_with_clock(depth: i64, log_drops: bool, clock: Arc<dyn Clock>) -> Fixture {
    let sdk = Arc::new(VirtualSdk::new(1));
    let events = Arc::new(RecordingEventSink::new());
    let mut player = CapturePlayer::with_clock(sdk.clone(), events.clone(), clock);
    let options = MediaOptions::new()
        .with(keys::DEVICE_INDEX, 0i64)
        .with(keys::COLOR_FORMAT, 0i64)
        .with(keys::MAX_AUDIO_FRAME_BUFFER, depth)
        .with(keys::MAX_VIDEO_FRAME_BUFFER, depth)
        .with(keys::LOG_DROP_FRAMES, log_drops);
    player.open(URL, &options).unwrap();
    (player, sdk, events)
}

fn start(player: &mut CapturePlayer, sdk: &VirtualSdk) {
    sdk.complete_initialization(0, true);
    player.tick_input();
    assert_eq!(player.media_state(), CaptureState::Playing);
}

fn deliver_video(sdk: &VirtualSdk, count: usize) {
    let mut frame =
        SyntheticFrame::video(8, 2, PixelFormat::Yuv8Bit, FieldDominance::Progressive, 0);
    for _ in 0..count {
        sdk.deliver_frame(0, &mut frame.info());
    }
}

#[test]
#[traced_test]
fn burst_past_capacity_is_trimmed_and_reported() {
    let (mut player, sdk, _events) = player_with_depth(4, true);
    start(&mut player, &sdk);

    deliver_video(&sdk, 10);
    assert_eq!(player.num_video_samples(), 8);

    let report = player.tick_fetch().unwrap();
    assert_eq!(report.video, 6);
    assert_eq!(report.audio, 0);
    assert_eq!(player.num_video_samples(), 4);
    assert!(logs_contain("Lost 6 video frames on input capture://0"));

    assert_eq!(player.tick_fetch().unwrap().video, 0);
}

#[test]
fn steady_ticks_trim_one_frame_each() {
    let (mut player, sdk, _events) = player_with_depth(4, true);
    start(&mut player, &sdk);

    let mut lost = 0;
    for _ in 0..10 {
        deliver_video(&sdk, 1);
        lost += player.tick().unwrap().video;
        assert!(player.num_video_samples() <= 4);
    }
    assert_eq!(lost, 6);
}

#[test]
#[traced_test]
fn drops_are_silent_without_logging() {
    let (mut player, sdk, _events) = player_with_depth(4, false);
    start(&mut player, &sdk);

    deliver_video(&sdk, 10);
    // Only trimming is visible; hard-capacity drops were never counted.
    assert_eq!(player.tick_fetch().unwrap().video, 4);
    assert!(!logs_contain("Lost"));
}

#[test]
fn fetch_waits_for_playing() {
    let (mut player, sdk, _events) = player_with_depth(4, true);
    assert!(player.tick().is_none());
    assert_eq!(player.media_state(), CaptureState::Preparing);

    start(&mut player, &sdk);
    assert!(player.tick_fetch().is_some());
}

#[test]
fn audio_track_format_refreshes_on_fetch() {
    let (mut player, sdk, _events) = player_with_depth(8, false);
    start(&mut player, &sdk);

    let mut frame = SyntheticFrame::audio_only(8, 48_000, 16);
    sdk.deliver_frame(0, &mut frame.info());
    assert_eq!(player.audio_track_format().channels, 0);

    player.tick_fetch();
    let format = player.audio_track_format();
    assert_eq!(format.channels, 8);
    assert_eq!(format.sample_rate, 48_000);
    assert_eq!(format.bits_per_sample, 32);

    let audio = player.pop_audio_sample().unwrap();
    assert_eq!(audio.sample_count(), 128);
    assert_eq!(player.num_audio_samples(), 0);
}

#[test]
fn lost_signal_closes_the_player() {
    let (mut player, sdk, events) = player_with_depth(4, false);
    start(&mut player, &sdk);
    deliver_video(&sdk, 1);

    sdk.deliver_frame(0, &mut SyntheticFrame::no_signal().info());
    player.tick();

    assert_eq!(
        events.take(),
        vec![
            MediaEvent::TracksChanged,
            MediaEvent::MediaOpened,
            MediaEvent::PlaybackResumed,
            MediaEvent::MediaOpenFailed,
        ]
    );
    assert!(!player.is_open());
    assert_eq!(player.media_state(), CaptureState::Closed);
    assert_eq!(sdk.registration_count(), 0);
    assert!(player.pop_video_sample().is_none());
}

/// Stalls the next clock read after [`StallingClock::arm`], signalling
/// `entered` first so the test knows the capture thread is mid-decode.
struct StallingClock {
    armed: AtomicBool,
    entered: Barrier,
    stall: Duration,
}

impl StallingClock {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl Clock for StallingClock {
    fn now(&self) -> Duration {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            thread::sleep(self.stall);
        }
        Duration::from_secs(1)
    }
}

#[test]
fn fetch_does_not_wait_for_a_frame_in_flight() {
    let clock = Arc::new(StallingClock {
        armed: AtomicBool::new(false),
        entered: Barrier::new(2),
        stall: Duration::from_millis(500),
    });
    let (mut player, sdk, _events) = player_with_clock(8, false, clock.clone());
    start(&mut player, &sdk);

    let mut frame = SyntheticFrame::audio_only(2, 48_000, 16);
    sdk.deliver_frame(0, &mut frame.info());

    clock.arm();
    let producer = {
        let sdk = sdk.clone();
        thread::spawn(move || {
            let mut frame = SyntheticFrame::audio_only(2, 48_000, 16);
            sdk.deliver_frame(0, &mut frame.info());
        })
    };
    clock.entered.wait();

    let started = Instant::now();
    let report = player.tick_fetch();
    let timecode = player.last_timecode();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(250), "tick_fetch took {elapsed:?}");
    assert!(report.is_some());
    assert!(timecode.is_none());
    assert_eq!(player.audio_track_format().channels, 2);

    producer.join().unwrap();
    assert_eq!(player.num_audio_samples(), 2);
}

#[test]
#[traced_test]
fn unavailable_card_is_reported_once() {
    let sdk = Arc::new(VirtualSdk::new(1));
    sdk.set_card_usable(false);
    let mut player = CapturePlayer::new(sdk.clone(), Arc::new(RecordingEventSink::new()));

    assert!(player.open(URL, &MediaOptions::new()).is_err());
    assert!(!player.is_open());
    logs_assert(|lines: &[&str]| {
        match lines.iter().filter(|line| line.contains("Cannot open")).count() {
            1 => Ok(()),
            n => Err(format!("expected one warning, found {n}")),
        }
    });
}

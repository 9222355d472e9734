// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Runs the player against the virtual SDK.
//!
//! A producer thread plays the part of the card: it completes start-up and
//! delivers frames at the requested rate. The main thread ticks the player
//! like a host render loop and drains the queues.
//!
//! ```text
//! cargo run -p capture-player --example virtual_capture -- --frames 120 --host-fps 20 --log-drops
//! ```

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use capture_player::{CapturePlayer, MediaOptions, TracingEventSink, keys, request_raw_video_dump};
use capture_sdk::{FieldDominance, FrameRate, PixelFormat, SyntheticFrame, VirtualSdk};
use clap::Parser;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(version, about = "Capture from an in-process virtual card")]
struct Args {
    /// Frames the virtual card delivers before going silent.
    #[arg(long, default_value_t = 90)]
    frames: u32,

    /// Capture frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Host tick rate; lower than --fps to provoke drops.
    #[arg(long, default_value_t = 30)]
    host_fps: u32,

    /// Picture width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Picture height in lines.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Deliver interlaced frames.
    #[arg(long)]
    interlaced: bool,

    /// Capture 10-bit v210 instead of 8-bit UYVY.
    #[arg(long)]
    ten_bit: bool,

    /// Soft queue depth for audio and video.
    #[arg(long, default_value_t = 8)]
    depth: i64,

    /// Warn about lost frames on every tick.
    #[arg(long)]
    log_drops: bool,

    /// Attach stereo audio to every frame.
    #[arg(long)]
    audio: bool,

    /// Stamp LTC timecode on frames and burn it into progressive pictures.
    #[arg(long)]
    timecode: bool,

    /// Dump the first captured frame to the temp directory.
    #[arg(long)]
    dump: bool,
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

fn produce(sdk: Arc<VirtualSdk>, args: &Args) {
    let rate = FrameRate::new(args.fps, 1);
    let pixel_format = if args.ten_bit {
        PixelFormat::Yuv10Bit
    } else {
        PixelFormat::Yuv8Bit
    };
    let dominance = if args.interlaced {
        FieldDominance::Interlaced
    } else {
        FieldDominance::Progressive
    };

    sdk.complete_initialization(0, true);

    let interval = rate.as_interval();
    let start = Instant::now();
    for index in 0..args.frames {
        let mut frame =
            SyntheticFrame::video(args.width, args.height, pixel_format, dominance, 0x80);
        if args.audio {
            let samples_per_frame = (48_000 / args.fps.max(1)) as usize;
            frame = frame.with_audio(2, 48_000, samples_per_frame);
        }
        if args.timecode {
            let fps = rate.rounded().max(1);
            let seconds = index / fps;
            frame = frame.with_timecode(0, seconds / 60, seconds % 60, index % fps);
        }
        sdk.deliver_frame(0, &mut frame.info());

        if let Some(wait) = (interval * (index + 1)).checked_sub(start.elapsed()) {
            thread::sleep(wait);
        }
    }

    // Signal loss ends the run.
    sdk.deliver_frame(0, &mut SyntheticFrame::no_signal().info());
}

fn main() -> Result<(), capture_player::Error> {
    setup_logging();
    let args = Args::parse();

    let sdk = Arc::new(VirtualSdk::new(1));
    let mut player = CapturePlayer::new(sdk.clone(), Arc::new(TracingEventSink));
    let tick = Duration::from_secs(1) / args.host_fps.max(1);

    let mut options = MediaOptions::new();
    options
        .set(keys::DEVICE_INDEX, 0i64)
        .set(keys::COLOR_FORMAT, i64::from(args.ten_bit))
        .set(keys::FRAME_RATE_NUMERATOR, i64::from(args.fps))
        .set(keys::CAPTURE_AUDIO, args.audio)
        .set(keys::MAX_AUDIO_FRAME_BUFFER, args.depth)
        .set(keys::MAX_VIDEO_FRAME_BUFFER, args.depth)
        .set(keys::LOG_DROP_FRAMES, args.log_drops);
    if args.timecode {
        options
            .set(keys::TIMECODE_FORMAT, 1i64)
            .set(keys::ENCODE_TIMECODE_IN_TEXEL, true);
    }
    if args.dump {
        request_raw_video_dump();
    }

    let url = format!("capture://0/{}", Uuid::new_v4());
    player.open(&url, &options)?;

    let producer = thread::spawn(move || produce(sdk, &args));

    let mut pictures = 0usize;
    let mut audio_blocks = 0usize;
    let mut lost = 0u32;
    let mut audio_format = None;
    loop {
        if let Some(report) = player.tick() {
            lost += report.audio + report.video;
            audio_format = Some(player.audio_track_format());
        }
        while let Some(picture) = player.pop_video_sample() {
            if pictures % 30 == 0 {
                info!(
                    "Picture {pictures}: {}x{} {:?} at {:?}, timecode {:?}",
                    picture.width(),
                    picture.height(),
                    picture.format(),
                    picture.time(),
                    picture.timecode().map(|tc| tc.to_string())
                );
            }
            pictures += 1;
        }
        while player.pop_audio_sample().is_some() {
            audio_blocks += 1;
        }
        if !player.is_open() {
            break;
        }
        thread::sleep(tick);
    }

    let _ = producer.join();
    info!("Received {pictures} pictures and {audio_blocks} audio blocks, lost {lost} samples");
    info!("Audio format {audio_format:?}");
    Ok(())
}

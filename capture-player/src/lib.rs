// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! # capture-player: a tick-driven player over a capture card input
//!
//! [`CapturePlayer`] is the surface a host media framework talks to. It
//! opens one channel from string-keyed [`MediaOptions`], is ticked once per
//! host frame, and hands out the audio and video samples the capture thread
//! queued in between.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use capture_player::{CapturePlayer, MediaOptions, TracingEventSink, keys};
//! use capture_sdk::VirtualSdk;
//!
//! # fn main() -> Result<(), capture_player::Error> {
//! let sdk = Arc::new(VirtualSdk::new(1));
//! let mut player = CapturePlayer::new(sdk.clone(), Arc::new(TracingEventSink));
//!
//! let options = MediaOptions::new()
//!     .with(keys::DEVICE_INDEX, 0i64)
//!     .with(keys::CAPTURE_AUDIO, true)
//!     .with(keys::LOG_DROP_FRAMES, true);
//! player.open("capture://0", &options)?;
//!
//! sdk.complete_initialization(0, true);
//! loop {
//!     player.tick();
//!     while let Some(picture) = player.pop_video_sample() {
//!         // upload `picture.buffer()`
//! #       drop(picture);
//!     }
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle events
//!
//! Entering playback emits `TracksChanged`, `MediaOpened` and
//! `PlaybackResumed` through the [`MediaEventSink`]. A channel that fails
//! (start-up error, lost signal, format change) emits `MediaOpenFailed` and is
//! closed on the same tick; the host must open it again.

mod error;
mod events;
mod options;
mod player;

pub use capture_input::{
    AudioSample, AudioTrackFormat, CaptureState, DropReport, MediaEvent, Pooled, VideoSample,
    request_raw_video_dump,
};
pub use error::{Error, Result};
pub use events::{MediaEventSink, RecordingEventSink, TracingEventSink};
pub use options::{
    AudioChannelLayout, CALLBACK_PRIORITY, ColorFormat, MediaOptions, OptionValue, PlayerConfig,
    TimecodeFormat, keys,
};
pub use player::{CapturePlayer, PLAYER_NAME};

// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! # capture-input: frame ingest for capture cards
//!
//! Turns the SDK's per-frame callbacks into timestamped, timecode-aligned
//! samples held in bounded queues, and tracks the channel lifecycle for a
//! consumer that polls once per host frame.
//!
//! ## Architecture
//!
//! ```text
//!  SDK capture thread                           host tick thread
//! ┌──────────────────────┐                   ┌─────────────────────┐
//! │ InputCallback        │                   │ CaptureStateMachine │
//! │  └─ FrameDecoder ────┼──► SampleBuffer ◄─┼─ maintain / pop     │
//! │  └─ CaptureStateCell ┼───────────────────┼► sync               │
//! └──────────▲───────────┘                   └─────────────────────┘
//!            │ Arc, shared with the SDK
//!   ChannelRegistration
//! ```
//!
//! ## Key Concepts
//!
//! - **Registration**: [`ChannelRegistration`] owns the SDK token and one
//!   reference to the [`InputCallback`]; teardown is safe while the SDK is
//!   still dispatching.
//! - **Decoding**: [`FrameDecoder`] stamps presentation times from a
//!   [`Clock`] (or the timecode), splits interlaced frames into two fields and
//!   applies the queue admission policy.
//! - **Buffering**: [`SampleBuffer`] holds at most `2 * M` samples per kind
//!   and is trimmed back to `M` on every tick.
//! - **Telemetry**: the last audio format and timecode are published through
//!   a [`DecoderTelemetry`] the tick thread reads without taking the callback
//!   lock.
//! - **Lifecycle**: [`CaptureState`] is written by the capture side and read
//!   by [`CaptureStateMachine`], which yields the [`MediaEvent`]s to emit.
//!
//! ## Diagnostics
//!
//! [`request_raw_video_dump`] writes the next accepted video frame to disk,
//! once. [`burn_in::encode_timecode`] draws the timecode into progressive
//! pictures when enabled.

mod buffer;
mod clock;
mod decoder;
mod error;
mod pool;
mod raw_dump;
mod registration;
mod sample;
mod state;
mod telemetry;
mod timecode;

pub mod burn_in;

pub use buffer::{
    DEFAULT_MAX_BUFFER_DEPTH, DropReport, Enqueue, SampleBuffer, SampleQueue,
    TOLERATED_EXTRA_BUFFER_FACTOR,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use decoder::{
    DecodeOutcome, DecoderSettings, FrameDecoder, FrameStats, NO_SIGNAL_GRACE_PERIOD,
};
pub use error::{Error, Result};
pub use pool::{Pooled, Recycle, SamplePool};
pub use raw_dump::{is_raw_video_dump_pending, request_raw_video_dump};
pub use registration::{ChannelRegistration, InputCallback, ensure_available};
pub use sample::{
    AUDIO_BITS_PER_SAMPLE, AudioSample, AudioTrackFormat, Field, SampleFormat, VideoFrameDesc,
    VideoSample,
};
pub use state::{CaptureState, CaptureStateCell, CaptureStateMachine, MediaEvent, StateChange};
pub use telemetry::DecoderTelemetry;
pub use timecode::Timecode;

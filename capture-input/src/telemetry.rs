// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Values the capture thread publishes for the tick thread.
//!
//! Written by the decoder while it holds the callback lock, read by the
//! consumer without it. The audio format is three independent atomics; a
//! reader racing a format change may see one stale field for one tick.

use std::{
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use crate::{AudioTrackFormat, Timecode};

/// Last audio format and timecode seen on one channel.
#[derive(Debug, Default)]
pub struct DecoderTelemetry {
    bits_per_sample: AtomicU32,
    channels: AtomicU32,
    sample_rate: AtomicU32,
    // Only ever locked to copy a value in or out.
    last_timecode: Mutex<Option<(Timecode, Duration)>>,
}

impl DecoderTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format of the last accepted audio block.
    pub fn audio_track_format(&self) -> AudioTrackFormat {
        AudioTrackFormat {
            bits_per_sample: self.bits_per_sample.load(Ordering::Acquire),
            channels: self.channels.load(Ordering::Acquire),
            sample_rate: self.sample_rate.load(Ordering::Acquire),
        }
    }

    pub(crate) fn publish_audio_track_format(&self, format: AudioTrackFormat) {
        self.bits_per_sample
            .store(format.bits_per_sample, Ordering::Release);
        self.channels.store(format.channels, Ordering::Release);
        self.sample_rate.store(format.sample_rate, Ordering::Release);
    }

    /// Most recent hardware timecode and its timespan.
    pub fn last_timecode(&self) -> Option<(Timecode, Duration)> {
        *self
            .last_timecode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish_timecode(&self, timecode: Timecode, timespan: Duration) {
        *self
            .last_timecode
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((timecode, timespan));
    }
}

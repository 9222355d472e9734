// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Channel lifecycle.
//!
//! ```text
//! Closed ──► Preparing ──► Playing
//!               │             │
//!               └──► Error ◄──┘      (init failure, no signal, format change)
//!
//! any ──► Stopped                     (explicit teardown, terminal)
//! ```
//!
//! The capture thread writes the current state into a [`CaptureStateCell`];
//! the consumer polls it once per tick through a [`CaptureStateMachine`],
//! which turns changes into lifecycle events.

use std::{
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a capture channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CaptureState {
    #[default]
    Closed = 0,
    /// Registered with the SDK, waiting for start-up to complete.
    Preparing = 1,
    /// Frames are being decoded.
    Playing = 2,
    /// Failed; the consumer must close and reopen.
    Error = 3,
    /// Torn down.
    Stopped = 4,
}

impl CaptureState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CaptureState::Preparing,
            2 => CaptureState::Playing,
            3 => CaptureState::Error,
            4 => CaptureState::Stopped,
            _ => CaptureState::Closed,
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Closed => "closed",
            CaptureState::Preparing => "preparing",
            CaptureState::Playing => "playing",
            CaptureState::Error => "error",
            CaptureState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Lock-free slot holding the state reported by the capture side.
#[derive(Debug, Default)]
pub struct CaptureStateCell(AtomicU8);

impl CaptureStateCell {
    pub fn new(state: CaptureState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> CaptureState {
        CaptureState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Stores `state` unless the cell is already [`CaptureState::Stopped`].
    /// Returns `false` if the store was refused.
    pub fn store(&self, state: CaptureState) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != CaptureState::Stopped as u8).then_some(state as u8)
            })
            .is_ok()
    }
}

/// Notifications delivered to the host's event sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    TracksChanged,
    MediaOpened,
    PlaybackResumed,
    MediaOpenFailed,
}

const PLAYING_EVENTS: &[MediaEvent] = &[
    MediaEvent::TracksChanged,
    MediaEvent::MediaOpened,
    MediaEvent::PlaybackResumed,
];
const ERROR_EVENTS: &[MediaEvent] = &[MediaEvent::MediaOpenFailed];

/// A change observed by [`CaptureStateMachine::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: CaptureState,
    pub to: CaptureState,
}

impl StateChange {
    /// Events to emit, in order.
    pub fn events(&self) -> &'static [MediaEvent] {
        match self.to {
            CaptureState::Playing => PLAYING_EVENTS,
            CaptureState::Error => ERROR_EVENTS,
            _ => &[],
        }
    }

    /// `true` if the consumer must tear the channel down.
    pub fn requires_close(&self) -> bool {
        self.to == CaptureState::Error
    }
}

/// Consumer-side view of the channel state.
#[derive(Debug, Default)]
pub struct CaptureStateMachine {
    current: CaptureState,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last state observed by the consumer.
    pub fn current(&self) -> CaptureState {
        self.current
    }

    /// Adopts `reported` and describes the change, if any.
    pub fn sync(&mut self, reported: CaptureState) -> Option<StateChange> {
        if reported == self.current {
            return None;
        }
        let change = StateChange {
            from: self.current,
            to: reported,
        };
        self.current = reported;
        Some(change)
    }

    /// Returns to [`CaptureState::Closed`] without emitting anything.
    pub fn reset(&mut self) {
        self.current = CaptureState::Closed;
    }
}

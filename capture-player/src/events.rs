// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Where lifecycle notifications go.

use std::sync::{Mutex, PoisonError};

use capture_input::MediaEvent;
use tracing::info;

/// Receives lifecycle events on the tick thread.
pub trait MediaEventSink: Send + Sync {
    fn receive_media_event(&self, event: MediaEvent);
}

/// Logs every event at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl MediaEventSink for TracingEventSink {
    fn receive_media_event(&self, event: MediaEvent) {
        info!("Media event: {event:?}");
    }
}

/// Keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<MediaEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<MediaEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns and forgets the events received so far.
    pub fn take(&self) -> Vec<MediaEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl MediaEventSink for RecordingEventSink {
    fn receive_media_event(&self, event: MediaEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

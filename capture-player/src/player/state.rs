// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime state of an open player.

use std::sync::Arc;

use capture_input::{ChannelRegistration, SampleBuffer};

use crate::PlayerConfig;

/// Everything that exists only while a channel is open.
pub(crate) struct Channel {
    pub config: PlayerConfig,
    pub samples: Arc<SampleBuffer>,
    pub registration: ChannelRegistration,
}

impl Channel {
    /// Tears the registration down first, then frees queued samples and
    /// pooled storage.
    pub fn close(mut self) {
        self.registration.uninitialize();
        self.samples.clear();
    }
}

/// Player state: `None` while closed.
#[derive(Default)]
pub(crate) struct Context {
    pub channel: Option<Channel>,
}

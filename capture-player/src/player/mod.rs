// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! The consumer-side player.
//!
//! A host drives [`CapturePlayer`] from one thread, once per frame:
//!
//! 1. [`CapturePlayer::tick_input`] adopts the state reported by the capture
//!    thread, emits lifecycle events and closes the channel on error;
//! 2. [`CapturePlayer::tick_fetch`] trims the sample queues, collects drop
//!    telemetry and refreshes the audio track format.
//!
//! Neither step blocks on the capture thread beyond short queue locks.

mod state;

#[cfg(test)]
mod player_tests;

use std::sync::Arc;

use capture_input::{
    AudioSample, AudioTrackFormat, CaptureState, CaptureStateMachine, ChannelRegistration, Clock,
    DropReport, MonotonicClock, Pooled, SampleBuffer, Timecode, VideoSample, ensure_available,
};
use capture_sdk::CaptureSdk;
use tracing::{debug, error, info, warn};

use crate::{Error, MediaEventSink, MediaOptions, PlayerConfig, Result};
use state::{Channel, Context};

/// Name the player registers under with the host.
pub const PLAYER_NAME: &str = "CaptureInput";

/// Tick-driven player over one capture channel.
pub struct CapturePlayer {
    sdk: Arc<dyn CaptureSdk>,
    events: Arc<dyn MediaEventSink>,
    clock: Arc<dyn Clock>,
    context: Context,
    machine: CaptureStateMachine,
    url: String,
    audio_track_format: AudioTrackFormat,
}

impl CapturePlayer {
    pub fn new(sdk: Arc<dyn CaptureSdk>, events: Arc<dyn MediaEventSink>) -> Self {
        Self::with_clock(sdk, events, Arc::new(MonotonicClock::new()))
    }

    /// Uses `clock` for presentation times and the no-signal grace period.
    pub fn with_clock(
        sdk: Arc<dyn CaptureSdk>,
        events: Arc<dyn MediaEventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sdk,
            events,
            clock,
            context: Context::default(),
            machine: CaptureStateMachine::new(),
            url: String::new(),
            audio_track_format: AudioTrackFormat::default(),
        }
    }

    pub fn player_name(&self) -> &'static str {
        PLAYER_NAME
    }

    /// Opens the channel described by `options`.
    ///
    /// Fails without side effects if the SDK is unavailable or the options
    /// are invalid. A failed registration is torn down before returning.
    pub fn open(&mut self, url: &str, options: &MediaOptions) -> Result<()> {
        self.check_available(url)?;
        let config = PlayerConfig::from_options(options)?;
        self.open_channel(url, config)
    }

    /// Like [`Self::open`] with an already built configuration.
    pub fn open_with_config(&mut self, url: &str, config: PlayerConfig) -> Result<()> {
        self.check_available(url)?;
        self.open_channel(url, config)
    }

    fn open_channel(&mut self, url: &str, config: PlayerConfig) -> Result<()> {
        config.validate()?;
        self.close();

        let samples = Arc::new(SampleBuffer::new(
            config.max_audio_frame_buffer,
            config.max_video_frame_buffer,
        ));
        let mut registration = ChannelRegistration::new(
            self.sdk.clone(),
            config.device_index,
            samples.clone(),
            config.decoder_settings(url, self.clock.clone()),
        );

        if let Err(e) = registration.initialize(&config.channel_options()) {
            error!("Failed to open {url}: {e}");
            registration.uninitialize();
            return Err(e.into());
        }

        info!(
            device_index = config.device_index,
            "Opened {url} ({:?}, {})",
            config.color_format,
            config.frame_rate
        );
        self.url = url.to_string();
        self.context.channel = Some(Channel {
            config,
            samples,
            registration,
        });
        Ok(())
    }

    fn check_available(&self, url: &str) -> Result<()> {
        ensure_available(self.sdk.as_ref()).map_err(|e| {
            warn!("Cannot open {url}: {e}");
            Error::from(e)
        })
    }

    /// Unregisters the channel and frees its samples. Does nothing when
    /// already closed.
    pub fn close(&mut self) {
        if let Some(channel) = self.context.channel.take() {
            debug!("Closing {}", self.url);
            channel.close();
        }
        self.machine.reset();
        self.audio_track_format = AudioTrackFormat::default();
    }

    /// State sync phase. Emits lifecycle events for a change reported by the
    /// capture thread and closes the channel if it failed.
    pub fn tick_input(&mut self) {
        let reported = self
            .context
            .channel
            .as_ref()
            .map_or(CaptureState::Closed, |channel| channel.registration.state());

        let Some(change) = self.machine.sync(reported) else {
            return;
        };
        debug!("{} went from {} to {}", self.url, change.from, change.to);
        for event in change.events() {
            self.events.receive_media_event(*event);
        }
        if change.requires_close() {
            self.close();
        }
    }

    /// Data phase. Runs only while playing; returns the samples lost since
    /// the previous call.
    pub fn tick_fetch(&mut self) -> Option<DropReport> {
        let channel = self.context.channel.as_ref()?;
        if channel.registration.state() != CaptureState::Playing {
            return None;
        }

        if let Some(format) = channel.registration.audio_track_format() {
            self.audio_track_format = format;
        }

        let log_drops = channel.config.log_drop_frames;
        let report = channel.samples.maintain(log_drops);
        if log_drops {
            if report.audio > 0 {
                warn!(
                    "Lost {} audio frames on input {}. Frame rate is either too slow or buffering capacity is too small.",
                    report.audio, self.url
                );
            }
            if report.video > 0 {
                warn!(
                    "Lost {} video frames on input {}. Frame rate is either too slow or buffering capacity is too small.",
                    report.video, self.url
                );
            }
        }
        Some(report)
    }

    /// Runs both tick phases in order.
    pub fn tick(&mut self) -> Option<DropReport> {
        self.tick_input();
        self.tick_fetch()
    }

    /// State as of the last [`Self::tick_input`].
    pub fn media_state(&self) -> CaptureState {
        self.machine.current()
    }

    /// Url of the last opened channel.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Audio format as of the last [`Self::tick_fetch`].
    pub fn audio_track_format(&self) -> AudioTrackFormat {
        self.audio_track_format
    }

    pub fn config(&self) -> Option<&PlayerConfig> {
        self.context.channel.as_ref().map(|channel| &channel.config)
    }

    /// Last hardware timecode seen on the open channel and its timespan.
    pub fn last_timecode(&self) -> Option<(Timecode, std::time::Duration)> {
        self.context
            .channel
            .as_ref()
            .and_then(|channel| channel.registration.last_timecode())
    }

    /// Oldest queued picture.
    pub fn pop_video_sample(&self) -> Option<Pooled<VideoSample>> {
        self.samples()?.video().pop()
    }

    /// Oldest queued audio block.
    pub fn pop_audio_sample(&self) -> Option<Pooled<AudioSample>> {
        self.samples()?.audio().pop()
    }

    pub fn num_video_samples(&self) -> usize {
        self.samples().map_or(0, |samples| samples.video().len())
    }

    pub fn num_audio_samples(&self) -> usize {
        self.samples().map_or(0, |samples| samples.audio().len())
    }

    pub fn is_open(&self) -> bool {
        self.context.channel.is_some()
    }

    fn samples(&self) -> Option<&SampleBuffer> {
        self.context
            .channel
            .as_ref()
            .map(|channel| channel.samples.as_ref())
    }
}

impl Drop for CapturePlayer {
    fn drop(&mut self) {
        self.close();
    }
}

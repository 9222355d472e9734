// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Channel registration and the callback object the SDK dispatches into.
//!
//! The callback is shared between [`ChannelRegistration`] and the SDK as an
//! `Arc<InputCallback>`. Tearing down a registration:
//!
//! 1. locks the callback and clears its back-reference to the sample
//!    buffer, so any event still in flight becomes a no-op;
//! 2. marks the channel [`CaptureState::Stopped`];
//! 3. unregisters from the SDK;
//! 4. drops its own reference. The callback is freed once the SDK releases
//!    the last clone it may still hold for a dispatch.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use capture_sdk::{
    CaptureSdk, ChannelInfo, FormatInfo, FrameReceivedInfo, InputChannelOptions,
    InputEventCallback, UniqueIdentifier,
};
use tracing::{debug, error, info, trace, warn};

use crate::{
    AudioTrackFormat, DecoderTelemetry, Error, Result, SampleBuffer, Timecode,
    decoder::{DecodeOutcome, DecoderSettings, FrameDecoder},
    state::{CaptureState, CaptureStateCell},
};

/// Fails if the SDK cannot serve any channel in this process.
pub fn ensure_available(sdk: &dyn CaptureSdk) -> Result<()> {
    if !sdk.is_initialized() {
        return Err(Error::RuntimeNotInitialized);
    }
    if !sdk.can_use_card() {
        return Err(Error::CardUnavailable);
    }
    Ok(())
}

struct CallbackInner {
    /// Cleared on teardown; `None` turns every event into a no-op.
    samples: Option<Arc<SampleBuffer>>,
    decoder: FrameDecoder,
}

/// The callback registered for one channel.
pub struct InputCallback {
    url: String,
    state: CaptureStateCell,
    telemetry: Arc<DecoderTelemetry>,
    inner: Mutex<CallbackInner>,
}

impl InputCallback {
    fn new(samples: Arc<SampleBuffer>, settings: DecoderSettings) -> Self {
        let url = settings.url.clone();
        let decoder = FrameDecoder::new(settings);
        Self {
            url,
            state: CaptureStateCell::default(),
            telemetry: decoder.telemetry(),
            inner: Mutex::new(CallbackInner {
                samples: Some(samples),
                decoder,
            }),
        }
    }

    /// State last reported by the capture side.
    pub fn state(&self) -> CaptureState {
        self.state.load()
    }

    /// `false` once the registration has been torn down.
    pub fn is_attached(&self) -> bool {
        self.lock().samples.is_some()
    }

    /// Does not wait for a frame being decoded.
    pub fn audio_track_format(&self) -> AudioTrackFormat {
        self.telemetry.audio_track_format()
    }

    /// Does not wait for a frame being decoded.
    pub fn last_timecode(&self) -> Option<(Timecode, Duration)> {
        self.telemetry.last_timecode()
    }

    fn detach(&self) {
        let mut inner = self.lock();
        inner.samples = None;
        self.state.store(CaptureState::Stopped);
    }

    fn lock(&self) -> MutexGuard<'_, CallbackInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputEventCallback for InputCallback {
    fn on_initialization_completed(&self, success: bool) {
        let inner = self.lock();
        if inner.samples.is_none() {
            return;
        }
        if success {
            info!("Input {} started", self.url);
            self.state.store(CaptureState::Playing);
        } else {
            error!("Input {} failed to start", self.url);
            self.state.store(CaptureState::Error);
        }
    }

    fn on_shutdown_completed(&self) {
        let inner = self.lock();
        if inner.samples.is_some() {
            debug!("Input {} shut down", self.url);
            self.state.store(CaptureState::Closed);
        }
    }

    fn on_frame_received(&self, frame: &mut FrameReceivedInfo<'_>) {
        let mut inner = self.lock();
        let CallbackInner { samples, decoder } = &mut *inner;
        let Some(samples) = samples.as_deref() else {
            return;
        };

        match decoder.decode(frame, self.state.load(), samples) {
            DecodeOutcome::SignalLost => {
                self.state.store(CaptureState::Error);
            }
            DecodeOutcome::Decoded(stats) => {
                trace!(url = %self.url, ?stats, "Decoded frame");
            }
            DecodeOutcome::AwaitingSignal | DecodeOutcome::Ignored => {}
        }
    }

    fn on_frame_format_changed(&self, format: &FormatInfo) {
        let inner = self.lock();
        if inner.samples.is_none() {
            return;
        }
        error!(
            "Input format of {} changed to {}x{} @ {}; reopen required",
            self.url, format.width, format.height, format.frame_rate
        );
        self.state.store(CaptureState::Error);
    }

    fn on_interlaced_odd_field_event(&self) {}
}

/// One callback registered with the SDK for one channel.
///
/// Dropping the registration tears it down.
pub struct ChannelRegistration {
    sdk: Arc<dyn CaptureSdk>,
    channel: ChannelInfo,
    callback: Option<Arc<InputCallback>>,
    identifier: Option<UniqueIdentifier>,
}

impl ChannelRegistration {
    /// Builds the callback object without registering it.
    pub fn new(
        sdk: Arc<dyn CaptureSdk>,
        device_index: u32,
        samples: Arc<SampleBuffer>,
        settings: DecoderSettings,
    ) -> Self {
        Self {
            sdk,
            channel: ChannelInfo { device_index },
            callback: Some(Arc::new(InputCallback::new(samples, settings))),
            identifier: None,
        }
    }

    /// Registers the callback. Moves to [`CaptureState::Preparing`] on
    /// success and [`CaptureState::Error`] on failure.
    ///
    /// The SDK may report initialisation before this returns.
    pub fn initialize(&mut self, options: &InputChannelOptions) -> Result<()> {
        let Some(callback) = &self.callback else {
            return Err(Error::Other("registration was already torn down".to_string()));
        };
        if self.identifier.is_some() {
            return Err(Error::Other(format!(
                "channel {} is already registered",
                self.channel.device_index
            )));
        }

        callback.state.store(CaptureState::Preparing);
        let shared: Arc<dyn InputEventCallback> = callback.clone();
        match self
            .sdk
            .register_callback_for_channel(&self.channel, options, shared)
        {
            Ok(identifier) => {
                debug!(device_index = self.channel.device_index, %identifier, "Channel registered");
                self.identifier = Some(identifier);
                Ok(())
            }
            Err(source) => {
                callback.state.store(CaptureState::Error);
                Err(Error::RegistrationFailed {
                    device_index: self.channel.device_index,
                    source,
                })
            }
        }
    }

    /// Detaches the callback, unregisters it and releases this side's
    /// reference. Safe to call repeatedly and while the SDK is dispatching.
    pub fn uninitialize(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        callback.detach();

        if let Some(identifier) = self.identifier.take()
            && let Err(e) = self
                .sdk
                .unregister_callback_for_channel(&self.channel, identifier)
        {
            warn!(
                "Failed to unregister channel {}: {e}",
                self.channel.device_index
            );
        }
    }

    pub fn device_index(&self) -> u32 {
        self.channel.device_index
    }

    /// State reported by the capture side; [`CaptureState::Stopped`] after
    /// teardown.
    pub fn state(&self) -> CaptureState {
        self.callback
            .as_ref()
            .map_or(CaptureState::Stopped, |callback| callback.state())
    }

    pub fn is_registered(&self) -> bool {
        self.identifier.is_some()
    }

    /// Format of the last audio block the callback accepted.
    pub fn audio_track_format(&self) -> Option<AudioTrackFormat> {
        self.callback.as_ref().map(|c| c.audio_track_format())
    }

    /// Last hardware timecode and its timespan.
    pub fn last_timecode(&self) -> Option<(Timecode, Duration)> {
        self.callback.as_ref().and_then(|c| c.last_timecode())
    }

    /// A weak handle on the callback, for observing when it is freed.
    pub fn downgrade(&self) -> Weak<InputCallback> {
        self.callback.as_ref().map_or_else(Weak::new, Arc::downgrade)
    }
}

impl Drop for ChannelRegistration {
    fn drop(&mut self) {
        self.uninitialize();
    }
}

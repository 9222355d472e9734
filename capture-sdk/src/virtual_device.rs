// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! In-process capture device.
//!
//! [`VirtualSdk`] implements [`CaptureSdk`] without hardware. Tests and demos
//! drive it by hand: complete initialisation, push frames, change formats.
//! Dispatch follows the real SDK's contract: the callback list is cloned under
//! the registry lock and invoked after the lock is released, so an event can
//! race with unregistration exactly as it does on a card.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, trace};

use crate::{
    CaptureSdk, ChannelInfo, Error, FieldDominance, FormatInfo, FrameReceivedInfo,
    HardwareTimecode, InputChannelOptions, InputEventCallback, PixelFormat, Result,
    UniqueIdentifier,
};

struct VirtualChannel {
    channel: ChannelInfo,
    options: InputChannelOptions,
    callback: Arc<dyn InputEventCallback>,
}

/// A capture SDK backed by nothing but memory.
pub struct VirtualSdk {
    initialized: AtomicBool,
    card_usable: AtomicBool,
    reject_registrations: AtomicBool,
    device_count: u32,
    channels: Mutex<HashMap<UniqueIdentifier, VirtualChannel>>,
}

impl VirtualSdk {
    /// Creates an initialised SDK exposing `device_count` connectors.
    pub fn new(device_count: u32) -> Self {
        Self {
            initialized: AtomicBool::new(true),
            card_usable: AtomicBool::new(true),
            reject_registrations: AtomicBool::new(false),
            device_count,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Simulates the vendor runtime being (un)available.
    pub fn set_initialized(&self, initialized: bool) {
        self.initialized.store(initialized, Ordering::SeqCst);
    }

    /// Simulates card usage being (dis)allowed in this process.
    pub fn set_card_usable(&self, usable: bool) {
        self.card_usable.store(usable, Ordering::SeqCst);
    }

    /// Makes every subsequent registration fail.
    pub fn set_reject_registrations(&self, reject: bool) {
        self.reject_registrations.store(reject, Ordering::SeqCst);
    }

    /// Number of live registrations.
    pub fn registration_count(&self) -> usize {
        self.lock().len()
    }

    /// Options the channel at `device_index` was registered with.
    pub fn channel_options(&self, device_index: u32) -> Option<InputChannelOptions> {
        self.lock()
            .values()
            .find(|c| c.channel.device_index == device_index)
            .map(|c| c.options.clone())
    }

    /// Reports the end of asynchronous start-up to the channel's callbacks.
    pub fn complete_initialization(&self, device_index: u32, success: bool) -> usize {
        self.dispatch(device_index, |cb| cb.on_initialization_completed(success))
    }

    /// Reports the end of shutdown to the channel's callbacks.
    pub fn complete_shutdown(&self, device_index: u32) -> usize {
        self.dispatch(device_index, |cb| cb.on_shutdown_completed())
    }

    /// Delivers one frame event. Returns the number of callbacks invoked.
    pub fn deliver_frame(&self, device_index: u32, frame: &mut FrameReceivedInfo<'_>) -> usize {
        self.dispatch(device_index, |cb| cb.on_frame_received(frame))
    }

    /// Reports a signal format change.
    pub fn change_format(&self, device_index: u32, format: &FormatInfo) -> usize {
        self.dispatch(device_index, |cb| cb.on_frame_format_changed(format))
    }

    /// Reports the start of an odd field.
    pub fn signal_odd_field(&self, device_index: u32) -> usize {
        self.dispatch(device_index, |cb| cb.on_interlaced_odd_field_event())
    }

    fn dispatch(&self, device_index: u32, mut event: impl FnMut(&dyn InputEventCallback)) -> usize {
        // Clone out of the lock so callbacks may unregister themselves.
        let targets: Vec<Arc<dyn InputEventCallback>> = self
            .lock()
            .values()
            .filter(|c| c.channel.device_index == device_index)
            .map(|c| c.callback.clone())
            .collect();

        for callback in &targets {
            event(callback.as_ref());
        }
        trace!(device_index, callbacks = targets.len(), "Dispatched event");
        targets.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UniqueIdentifier, VirtualChannel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for VirtualSdk {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CaptureSdk for VirtualSdk {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn can_use_card(&self) -> bool {
        self.card_usable.load(Ordering::SeqCst)
    }

    fn register_callback_for_channel(
        &self,
        channel: &ChannelInfo,
        options: &InputChannelOptions,
        callback: Arc<dyn InputEventCallback>,
    ) -> Result<UniqueIdentifier> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        if channel.device_index >= self.device_count {
            return Err(Error::DeviceNotFound {
                device_index: channel.device_index,
            });
        }
        if self.reject_registrations.load(Ordering::SeqCst) {
            return Err(Error::Rejected("registrations disabled".to_string()));
        }

        let mut channels = self.lock();
        if channels
            .values()
            .any(|c| c.channel.device_index == channel.device_index)
        {
            return Err(Error::ChannelBusy {
                device_index: channel.device_index,
            });
        }

        let identifier = UniqueIdentifier::new();
        channels.insert(
            identifier,
            VirtualChannel {
                channel: *channel,
                options: options.clone(),
                callback,
            },
        );
        debug!(device_index = channel.device_index, %identifier, "Registered input callback");
        Ok(identifier)
    }

    fn unregister_callback_for_channel(
        &self,
        channel: &ChannelInfo,
        identifier: UniqueIdentifier,
    ) -> Result<()> {
        match self.lock().remove(&identifier) {
            Some(_) => {
                debug!(
                    device_index = channel.device_index,
                    %identifier,
                    "Unregistered input callback"
                );
                Ok(())
            }
            None => Err(Error::UnknownRegistration),
        }
    }
}

/// Owned buffers for one synthetic frame event.
///
/// Builds the borrowed [`FrameReceivedInfo`] a real SDK would hand out.
#[derive(Debug, Clone, Default)]
pub struct SyntheticFrame {
    pub has_input_source: bool,
    pub video: Option<Vec<u8>>,
    pub pitch: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_format: Option<PixelFormat>,
    pub field_dominance: FieldDominance,
    pub audio: Option<Vec<u8>>,
    pub audio_channels: u32,
    pub audio_rate: u32,
    pub timecode: Option<HardwareTimecode>,
}

impl SyntheticFrame {
    /// A heartbeat with no source connected and no audio.
    pub fn no_signal() -> Self {
        Self::default()
    }

    /// A video frame filled with `fill`, pitch derived from the pixel format.
    pub fn video(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        field_dominance: FieldDominance,
        fill: u8,
    ) -> Self {
        let pitch = pixel_format.row_bytes(width);
        Self {
            has_input_source: true,
            video: Some(vec![fill; pitch as usize * height as usize]),
            pitch,
            width,
            height,
            pixel_format: Some(pixel_format),
            field_dominance,
            ..Default::default()
        }
    }

    /// An audio-only block of `samples_per_channel` frames.
    pub fn audio_only(channels: u32, rate: u32, samples_per_channel: usize) -> Self {
        Self::default().with_audio(channels, rate, samples_per_channel)
    }

    /// Attaches interleaved 32-bit PCM; sample `i` has value `i`.
    pub fn with_audio(mut self, channels: u32, rate: u32, samples_per_channel: usize) -> Self {
        let total = samples_per_channel * channels as usize;
        let mut audio = Vec::with_capacity(total * 4);
        for i in 0..total {
            audio.extend_from_slice(&(i as i32).to_le_bytes());
        }
        self.audio = Some(audio);
        self.audio_channels = channels;
        self.audio_rate = rate;
        self
    }

    /// Attaches a hardware timecode.
    pub fn with_timecode(mut self, hours: u32, minutes: u32, seconds: u32, frames: u32) -> Self {
        self.timecode = Some(HardwareTimecode {
            hours,
            minutes,
            seconds,
            frames,
        });
        self
    }

    /// Borrows the buffers as an SDK event payload.
    pub fn info(&mut self) -> FrameReceivedInfo<'_> {
        FrameReceivedInfo {
            has_input_source: self.has_input_source,
            video_buffer: self.video.as_deref_mut(),
            video_pitch: self.pitch,
            video_width: self.width,
            video_height: self.height,
            pixel_format: self.pixel_format,
            field_dominance: self.field_dominance,
            audio_buffer: self.audio.as_deref(),
            number_of_audio_channel: self.audio_channels,
            audio_rate: self.audio_rate,
            timecode: self.timecode,
        }
    }
}

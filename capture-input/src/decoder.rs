// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Turns SDK frame events into queued samples.
//!
//! One [`FrameDecoder`] belongs to one channel registration and runs on the
//! SDK's capture thread. It never blocks on the consumer: a queue at hard
//! capacity means the sample is dropped, not waited for.

use std::{path::PathBuf, sync::Arc, time::Duration};

use capture_sdk::{FrameReceivedInfo, FrameRate, PixelFormat};
use tracing::{debug, info, trace, warn};

use crate::{
    AudioTrackFormat, Clock, DecoderTelemetry, MonotonicClock, SampleBuffer, SampleFormat,
    Timecode,
    burn_in::{self, EncodePixelFormat},
    raw_dump,
    sample::{AUDIO_BITS_PER_SAMPLE, Field, VideoFrameDesc},
    state::CaptureState,
};

/// How long a channel may report no signal before it is declared failed,
/// unless it has already delivered a frame.
pub const NO_SIGNAL_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Per-channel decoding behaviour.
#[derive(Clone)]
pub struct DecoderSettings {
    /// Source url, used in log messages.
    pub url: String,
    pub device_index: u32,
    /// Rate the channel was opened with. For interlaced sources this is the
    /// field rate.
    pub frame_rate: FrameRate,
    /// Warn once if frames arrive without a timecode.
    pub timecode_expected: bool,
    /// Stamp samples with the timecode's timespan instead of the clock.
    pub use_time_synchronization: bool,
    /// Burn the timecode into progressive pictures.
    pub encode_timecode_in_texel: bool,
    pub srgb_input: bool,
    /// Count producer-side drops.
    pub verify_drop_count: bool,
    /// Log every received timecode.
    pub log_timecode: bool,
    /// Where one-shot raw dumps are written.
    pub raw_dump_dir: PathBuf,
    pub clock: Arc<dyn Clock>,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            device_index: 0,
            frame_rate: FrameRate::default(),
            timecode_expected: false,
            use_time_synchronization: false,
            encode_timecode_in_texel: false,
            srgb_input: true,
            verify_drop_count: false,
            log_timecode: false,
            raw_dump_dir: std::env::temp_dir(),
            clock: Arc::new(MonotonicClock::new()),
        }
    }
}

/// What happened to one frame event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// No source yet, still inside the grace period.
    AwaitingSignal,
    /// The signal is gone; the channel must move to [`CaptureState::Error`].
    SignalLost,
    /// The channel is not playing; the event was ignored.
    Ignored,
    Decoded(FrameStats),
}

/// Samples produced and lost for one decoded event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub audio_queued: u32,
    pub video_queued: u32,
    pub audio_dropped: u32,
    pub video_dropped: u32,
}

/// Layouts derived from the SDK pixel format.
struct FrameLayout {
    sample: SampleFormat,
    encode: EncodePixelFormat,
    dump_file: Option<String>,
}

fn frame_layout(pixel_format: Option<PixelFormat>, device_index: u32) -> FrameLayout {
    match pixel_format {
        Some(PixelFormat::Yuv8Bit) => FrameLayout {
            sample: SampleFormat::CharUyvy,
            encode: EncodePixelFormat::CharUyvy,
            dump_file: Some(format!("capture_output_8_yuv_ch{device_index}.raw")),
        },
        Some(PixelFormat::Yuv10Bit) => FrameLayout {
            sample: SampleFormat::YuvV210,
            encode: EncodePixelFormat::YuvV210,
            dump_file: Some(format!("capture_output_10_yuv_ch{device_index}.raw")),
        },
        // Burn-in keeps the 8-bit packing for anything else.
        _ => FrameLayout {
            sample: SampleFormat::CharBgra,
            encode: EncodePixelFormat::CharUyvy,
            dump_file: None,
        },
    }
}

/// Per-channel frame decoder.
pub struct FrameDecoder {
    settings: DecoderSettings,
    first_no_signal: Option<Duration>,
    received_valid_frame: bool,
    warned_missing_timecode: bool,
    warned_unknown_format: bool,
    telemetry: Arc<DecoderTelemetry>,
}

impl FrameDecoder {
    pub fn new(settings: DecoderSettings) -> Self {
        Self {
            settings,
            first_no_signal: None,
            received_valid_frame: false,
            warned_missing_timecode: false,
            warned_unknown_format: false,
            telemetry: Arc::new(DecoderTelemetry::new()),
        }
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    /// `true` once any event reported a connected source.
    pub fn received_valid_frame(&self) -> bool {
        self.received_valid_frame
    }

    /// Most recent timecode and its timespan at the configured rate.
    pub fn last_timecode(&self) -> Option<(Timecode, Duration)> {
        self.telemetry.last_timecode()
    }

    /// Format of the last accepted audio block.
    pub fn audio_track_format(&self) -> AudioTrackFormat {
        self.telemetry.audio_track_format()
    }

    /// Shared handle on the values this decoder publishes, readable without
    /// access to the decoder itself.
    pub fn telemetry(&self) -> Arc<DecoderTelemetry> {
        self.telemetry.clone()
    }

    /// Decodes one frame event into `samples`.
    ///
    /// Video may be modified in place by the timecode burn-in.
    pub fn decode(
        &mut self,
        frame: &mut FrameReceivedInfo<'_>,
        state: CaptureState,
        samples: &SampleBuffer,
    ) -> DecodeOutcome {
        if !frame.has_input_source && frame.audio_buffer.is_none() {
            return self.on_no_signal();
        }
        if frame.has_input_source {
            self.received_valid_frame = true;
        }

        if state != CaptureState::Playing {
            trace!(url = %self.settings.url, %state, "Ignoring frame while not playing");
            return DecodeOutcome::Ignored;
        }

        let rate = self.settings.frame_rate;
        let interlaced = frame.field_dominance.is_interlaced();
        let now = self.settings.clock.now();
        let mut time = now;
        let mut time_odd = now + rate.as_interval();

        let mut timecode = None;
        let mut timecode_odd = None;
        if let Some(hardware) = frame.timecode {
            let decoded = Timecode::from_hardware(&hardware, &rate);
            if !decoded.is_frame_in_range(&rate, interlaced) {
                warn!(
                    "Timecode {decoded} from {} exceeds {} frames per second",
                    self.settings.url,
                    Timecode::frame_limit(&rate, interlaced)
                );
            }
            let timespan = decoded.to_timespan(&rate);
            if self.settings.use_time_synchronization {
                time = timespan;
                time_odd = timespan + rate.as_interval();
            }
            if self.settings.log_timecode {
                info!(url = %self.settings.url, "Timecode {decoded} ({timespan:?})");
            }
            self.telemetry.publish_timecode(decoded, timespan);
            timecode = Some(decoded);
            timecode_odd = Some(decoded.next_frame());
        } else if self.settings.timecode_expected && !self.warned_missing_timecode {
            warn!("{} is delivering frames without a timecode", self.settings.url);
            self.warned_missing_timecode = true;
        }

        let mut stats = FrameStats::default();

        if let Some(audio) = frame.audio_buffer {
            self.decode_audio(audio, frame, time, timecode, samples, &mut stats);
        }

        let pitch = frame.video_pitch;
        let width = frame.video_width;
        let height = frame.video_height;
        let pixel_format = frame.pixel_format;
        if let Some(video) = frame.video_buffer.as_deref_mut() {
            let reserved = usize::from(interlaced);
            if samples.video().has_room(reserved) {
                let layout = self.layout(pixel_format);
                let mut desc = VideoFrameDesc {
                    pitch,
                    width,
                    height,
                    format: layout.sample,
                    time,
                    frame_rate: rate,
                    timecode,
                    srgb: self.settings.srgb_input,
                };

                if let Some(file_name) = &layout.dump_file
                    && raw_dump::take_raw_video_dump_request()
                {
                    let size = (pitch as usize * height as usize).min(video.len());
                    let dir = &self.settings.raw_dump_dir;
                    if let Err(e) = raw_dump::write_raw_file(dir, file_name, &video[..size]) {
                        warn!("Failed to dump raw video from {}: {e}", self.settings.url);
                    }
                }

                if interlaced {
                    self.queue_video(Field::Even, video, &desc, samples, &mut stats);
                    desc.time = time_odd;
                    desc.timecode = timecode_odd;
                    self.queue_video(Field::Odd, video, &desc, samples, &mut stats);
                } else {
                    if self.settings.encode_timecode_in_texel
                        && let Some(tc) = &timecode
                        && !burn_in::encode_timecode(layout.encode, video, pitch, width, height, tc)
                    {
                        debug!("{width}x{height} picture is too small for a timecode strip");
                    }
                    self.queue_video(Field::Progressive, video, &desc, samples, &mut stats);
                }
            } else {
                stats.video_dropped += 1;
                if self.settings.verify_drop_count {
                    samples.video().record_drop();
                }
            }
        }

        DecodeOutcome::Decoded(stats)
    }

    fn on_no_signal(&mut self) -> DecodeOutcome {
        let now = self.settings.clock.now();
        let since = *self.first_no_signal.get_or_insert(now);
        if self.received_valid_frame || now.saturating_sub(since) > NO_SIGNAL_GRACE_PERIOD {
            warn!("No signal on {}", self.settings.url);
            return DecodeOutcome::SignalLost;
        }
        DecodeOutcome::AwaitingSignal
    }

    fn decode_audio(
        &mut self,
        audio: &[u8],
        frame: &FrameReceivedInfo<'_>,
        time: Duration,
        timecode: Option<Timecode>,
        samples: &SampleBuffer,
        stats: &mut FrameStats,
    ) {
        if !samples.audio().has_room(0) {
            stats.audio_dropped += 1;
            if self.settings.verify_drop_count {
                samples.audio().record_drop();
            }
            return;
        }

        let mut sample = samples.acquire_audio();
        match sample.initialize(
            audio,
            frame.number_of_audio_channel,
            frame.audio_rate,
            time,
            timecode,
        ) {
            Ok(()) => {
                self.telemetry.publish_audio_track_format(AudioTrackFormat {
                    bits_per_sample: AUDIO_BITS_PER_SAMPLE,
                    channels: frame.number_of_audio_channel,
                    sample_rate: frame.audio_rate,
                });
                samples.audio().push(sample);
                stats.audio_queued += 1;
            }
            Err(e) => debug!("Discarding audio from {}: {e}", self.settings.url),
        }
    }

    fn queue_video(
        &self,
        field: Field,
        video: &[u8],
        desc: &VideoFrameDesc,
        samples: &SampleBuffer,
        stats: &mut FrameStats,
    ) {
        let mut sample = samples.acquire_video();
        match sample.initialize_field(field, video, desc) {
            Ok(()) => {
                samples.video().push(sample);
                stats.video_queued += 1;
            }
            Err(e) => debug!("Discarding {field:?} picture from {}: {e}", self.settings.url),
        }
    }

    fn layout(&mut self, pixel_format: Option<PixelFormat>) -> FrameLayout {
        let layout = frame_layout(pixel_format, self.settings.device_index);
        if layout.dump_file.is_none() && !self.warned_unknown_format {
            debug!(
                "{} delivers {pixel_format:?}; queueing as BGRA with 8-bit burn-in",
                self.settings.url
            );
            self.warned_unknown_format = true;
        }
        layout
    }
}

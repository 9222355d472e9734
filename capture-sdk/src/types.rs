// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Descriptors exchanged with the SDK: channels, formats, timecodes and the
//! per-frame event payload.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Identifies one physical capture input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Zero-based index of the card connector.
    pub device_index: u32,
}

/// Frame rate as a rational number (e.g. 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Frames per `denominator` seconds.
    pub numerator: u32,
    /// Time base in seconds.
    pub denominator: u32,
}

impl FrameRate {
    /// Creates a new frame rate.
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Returns `true` when both terms are non-zero.
    pub fn is_valid(&self) -> bool {
        self.numerator != 0 && self.denominator != 0
    }

    /// Returns the rate in frames per second.
    pub fn as_decimal(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Returns the rate rounded to the nearest whole frame count.
    pub fn rounded(&self) -> u32 {
        self.as_decimal().round() as u32
    }

    /// Returns the duration of one frame.
    ///
    /// An invalid rate yields [`Duration::ZERO`].
    pub fn as_interval(&self) -> Duration {
        if !self.is_valid() {
            return Duration::ZERO;
        }
        let nanos = self.denominator as u128 * 1_000_000_000u128 / self.numerator as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(30, 1)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{} fps", self.numerator)
        } else {
            write!(f, "{:.2} fps", self.as_decimal())
        }
    }
}

/// Pixel packing of captured video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit YUV 4:2:2, UYVY byte order.
    Yuv8Bit,
    /// 10-bit YUV 4:2:2, v210 packed.
    Yuv10Bit,
    /// Any format the driver has no decoder for, with the SDK's raw code.
    Other(u32),
}

impl PixelFormat {
    /// Returns the minimum number of bytes for one row of `width` pixels.
    ///
    /// Unknown formats are assumed to be 4 bytes per pixel.
    pub fn row_bytes(&self, width: u32) -> u32 {
        match self {
            PixelFormat::Yuv8Bit => width.div_ceil(2) * 4,
            PixelFormat::Yuv10Bit => width.div_ceil(48) * 128,
            PixelFormat::Other(_) => width * 4,
        }
    }
}

/// Field dominance of the incoming signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldDominance {
    /// One complete picture per frame.
    #[default]
    Progressive,
    /// Two interleaved fields per frame.
    Interlaced,
    /// Progressive picture transported as two segments.
    ProgressiveSegmentedFrame,
}

impl FieldDominance {
    /// Returns `true` if each frame carries two fields.
    pub fn is_interlaced(&self) -> bool {
        matches!(self, FieldDominance::Interlaced)
    }
}

/// Source of embedded timecode the SDK should decode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimecodeFormat {
    /// No timecode.
    #[default]
    None,
    /// Linear timecode.
    Ltc,
    /// Vertical interval timecode, first field.
    Vitc1,
}

/// Video format of a channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    /// SDK display-mode selector.
    pub display_mode: u32,
    /// Picture width in pixels.
    pub width: u32,
    /// Picture height in lines.
    pub height: u32,
    /// Frame rate of the signal.
    pub frame_rate: FrameRate,
    /// Field dominance of the signal.
    pub field_dominance: FieldDominance,
}

/// Options passed to the SDK when registering an input channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputChannelOptions {
    /// Dispatch priority of the callback relative to other clients.
    pub callback_priority: i32,
    /// Deliver video buffers.
    pub read_video: bool,
    /// Deliver audio buffers.
    pub read_audio: bool,
    /// Requested video format.
    pub format_info: FormatInfo,
    /// Requested pixel packing.
    pub pixel_format: PixelFormat,
    /// Requested timecode source.
    pub timecode_format: TimecodeFormat,
    /// Number of interleaved audio channels.
    pub number_of_audio_channel: u32,
}

impl Default for InputChannelOptions {
    fn default() -> Self {
        Self {
            callback_priority: 10,
            read_video: true,
            read_audio: false,
            format_info: FormatInfo::default(),
            pixel_format: PixelFormat::Yuv8Bit,
            timecode_format: TimecodeFormat::None,
            number_of_audio_channel: 2,
        }
    }
}

/// Timecode as decoded by the hardware.
///
/// `frames` is linear: for rates above 30 fps it counts every frame rather
/// than wrapping at 30.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareTimecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

/// Payload of one frame-received event.
///
/// Buffers are owned by the SDK and only borrowed for the duration of the
/// callback. The video buffer is mutable so a driver may burn diagnostics into
/// it before copying.
#[derive(Debug, Default)]
pub struct FrameReceivedInfo<'a> {
    /// `false` when the connector reports no signal.
    pub has_input_source: bool,
    /// Picture bytes, `video_pitch * video_height` long.
    pub video_buffer: Option<&'a mut [u8]>,
    /// Bytes per row.
    pub video_pitch: u32,
    /// Picture width in pixels.
    pub video_width: u32,
    /// Picture height in lines (full frame, both fields).
    pub video_height: u32,
    /// Packing of `video_buffer`.
    pub pixel_format: Option<PixelFormat>,
    /// Field dominance of this frame.
    pub field_dominance: FieldDominance,
    /// Interleaved signed 32-bit little-endian PCM.
    pub audio_buffer: Option<&'a [u8]>,
    /// Channels interleaved in `audio_buffer`.
    pub number_of_audio_channel: u32,
    /// Audio sample rate in Hz.
    pub audio_rate: u32,
    /// Decoded timecode, if any was present.
    pub timecode: Option<HardwareTimecode>,
}

// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Player configuration.
//!
//! Hosts hand options over as a string-keyed [`MediaOptions`] bag. The player
//! turns it into a [`PlayerConfig`] once, at open time, and rejects anything
//! it cannot use before touching the SDK.
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | [`keys::DEVICE_INDEX`] | int | `0` |
//! | [`keys::CAPTURE_VIDEO`] | bool | `true` |
//! | [`keys::VIDEO_FORMAT`] | int | `0` |
//! | [`keys::FRAME_RATE_NUMERATOR`] / [`keys::FRAME_RATE_DENOMINATOR`] | int | `30` / `1` |
//! | [`keys::COLOR_FORMAT`] | [`ColorFormat`] ordinal | `Yuv8` |
//! | [`keys::SRGB_INPUT`] | bool | `true` |
//! | [`keys::TIMECODE_FORMAT`] | [`TimecodeFormat`] ordinal | `None` |
//! | [`keys::CAPTURE_AUDIO`] | bool | `false` |
//! | [`keys::AUDIO_CHANNELS`] | [`AudioChannelLayout`] ordinal | `Stereo` |
//! | [`keys::LOG_DROP_FRAMES`] | bool | `false` |
//! | [`keys::ENCODE_TIMECODE_IN_TEXEL`] | bool | `false` |
//! | [`keys::MAX_AUDIO_FRAME_BUFFER`] / [`keys::MAX_VIDEO_FRAME_BUFFER`] | int | `8` |
//! | [`keys::USE_TIME_SYNCHRONIZATION`] | bool | `false` |
//! | [`keys::LOG_TIMECODE`] | bool | `false` |
//! | [`keys::RAW_DUMP_DIR`] | string | system temp dir |

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use capture_input::{Clock, DEFAULT_MAX_BUFFER_DEPTH, DecoderSettings};
use capture_sdk::{FormatInfo, FrameRate, InputChannelOptions, PixelFormat};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Option keys understood by [`PlayerConfig::from_options`].
pub mod keys {
    pub const DEVICE_INDEX: &str = "device_index";
    pub const CAPTURE_VIDEO: &str = "capture_video";
    pub const VIDEO_FORMAT: &str = "video_format";
    pub const FRAME_RATE_NUMERATOR: &str = "frame_rate_numerator";
    pub const FRAME_RATE_DENOMINATOR: &str = "frame_rate_denominator";
    pub const COLOR_FORMAT: &str = "color_format";
    pub const SRGB_INPUT: &str = "srgb_input";
    pub const TIMECODE_FORMAT: &str = "timecode_format";
    pub const CAPTURE_AUDIO: &str = "capture_audio";
    pub const AUDIO_CHANNELS: &str = "audio_channels";
    pub const LOG_DROP_FRAMES: &str = "log_drop_frames";
    pub const ENCODE_TIMECODE_IN_TEXEL: &str = "encode_timecode_in_texel";
    pub const MAX_AUDIO_FRAME_BUFFER: &str = "max_audio_frame_buffer";
    pub const MAX_VIDEO_FRAME_BUFFER: &str = "max_video_frame_buffer";
    pub const USE_TIME_SYNCHRONIZATION: &str = "use_time_synchronization";
    pub const LOG_TIMECODE: &str = "log_timecode";
    pub const RAW_DUMP_DIR: &str = "raw_dump_dir";
}

/// Priority the player's callback is registered with.
pub const CALLBACK_PRIORITY: i32 = 10;

/// A single option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// String-keyed options as a host passes them to `open`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaOptions {
    values: HashMap<String, OptionValue>,
}

impl MediaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) -> &mut Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Builder form of [`Self::set`].
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Reads a boolean, or `default` if the key is absent.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(OptionValue::Bool(value)) => Ok(*value),
            Some(other) => Err(Error::invalid_option(
                key,
                format!("expected a bool, got {other:?}"),
            )),
        }
    }

    /// Reads an integer, or `default` if the key is absent.
    pub fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(OptionValue::Int(value)) => Ok(*value),
            Some(other) => Err(Error::invalid_option(
                key,
                format!("expected an integer, got {other:?}"),
            )),
        }
    }

    /// Reads a string, or `default` if the key is absent.
    pub fn get_string(&self, key: &str, default: &str) -> Result<String> {
        match self.values.get(key) {
            None => Ok(default.to_string()),
            Some(OptionValue::Str(value)) => Ok(value.clone()),
            Some(other) => Err(Error::invalid_option(
                key,
                format!("expected a string, got {other:?}"),
            )),
        }
    }

    /// Writes every field of `config` under its key.
    pub fn from_config(config: &PlayerConfig) -> Self {
        MediaOptions::new()
            .with(keys::DEVICE_INDEX, i64::from(config.device_index))
            .with(keys::CAPTURE_VIDEO, config.capture_video)
            .with(keys::VIDEO_FORMAT, i64::from(config.video_format))
            .with(keys::FRAME_RATE_NUMERATOR, i64::from(config.frame_rate.numerator))
            .with(keys::FRAME_RATE_DENOMINATOR, i64::from(config.frame_rate.denominator))
            .with(keys::COLOR_FORMAT, config.color_format as i64)
            .with(keys::SRGB_INPUT, config.srgb_input)
            .with(keys::TIMECODE_FORMAT, config.timecode_format as i64)
            .with(keys::CAPTURE_AUDIO, config.capture_audio)
            .with(keys::AUDIO_CHANNELS, config.audio_channels as i64)
            .with(keys::LOG_DROP_FRAMES, config.log_drop_frames)
            .with(keys::ENCODE_TIMECODE_IN_TEXEL, config.encode_timecode_in_texel)
            .with(keys::MAX_AUDIO_FRAME_BUFFER, config.max_audio_frame_buffer as i64)
            .with(keys::MAX_VIDEO_FRAME_BUFFER, config.max_video_frame_buffer as i64)
            .with(keys::USE_TIME_SYNCHRONIZATION, config.use_time_synchronization)
            .with(keys::LOG_TIMECODE, config.log_timecode)
            .with(keys::RAW_DUMP_DIR, config.raw_dump_dir.to_string_lossy().into_owned())
    }
}

/// Pixel packing requested from the card.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFormat {
    #[default]
    Yuv8 = 0,
    Yuv10 = 1,
}

/// Where the card reads timecode from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimecodeFormat {
    #[default]
    None = 0,
    Ltc = 1,
    Vitc = 2,
}

/// Audio channels requested from the card.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioChannelLayout {
    #[default]
    Stereo = 0,
    Surround8 = 1,
}

impl ColorFormat {
    fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(ColorFormat::Yuv8),
            1 => Some(ColorFormat::Yuv10),
            _ => None,
        }
    }

    pub fn pixel_format(self) -> PixelFormat {
        match self {
            ColorFormat::Yuv8 => PixelFormat::Yuv8Bit,
            ColorFormat::Yuv10 => PixelFormat::Yuv10Bit,
        }
    }
}

impl TimecodeFormat {
    fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(TimecodeFormat::None),
            1 => Some(TimecodeFormat::Ltc),
            2 => Some(TimecodeFormat::Vitc),
            _ => None,
        }
    }

    pub fn sdk_format(self) -> capture_sdk::TimecodeFormat {
        match self {
            TimecodeFormat::None => capture_sdk::TimecodeFormat::None,
            TimecodeFormat::Ltc => capture_sdk::TimecodeFormat::Ltc,
            TimecodeFormat::Vitc => capture_sdk::TimecodeFormat::Vitc1,
        }
    }
}

impl AudioChannelLayout {
    fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(AudioChannelLayout::Stereo),
            1 => Some(AudioChannelLayout::Surround8),
            _ => None,
        }
    }

    pub fn channel_count(self) -> u32 {
        match self {
            AudioChannelLayout::Stereo => 2,
            AudioChannelLayout::Surround8 => 8,
        }
    }
}

/// Validated player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub device_index: u32,
    pub capture_video: bool,
    /// Display-mode selector forwarded to the SDK.
    pub video_format: u32,
    /// Rate of the incoming signal; the field rate for interlaced sources.
    pub frame_rate: FrameRate,
    pub color_format: ColorFormat,
    pub srgb_input: bool,
    pub timecode_format: TimecodeFormat,
    pub capture_audio: bool,
    pub audio_channels: AudioChannelLayout,
    /// Warn about lost samples on every tick.
    pub log_drop_frames: bool,
    /// Only honoured when a timecode format is set.
    pub encode_timecode_in_texel: bool,
    pub max_audio_frame_buffer: usize,
    pub max_video_frame_buffer: usize,
    pub use_time_synchronization: bool,
    pub log_timecode: bool,
    pub raw_dump_dir: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            capture_video: true,
            video_format: 0,
            frame_rate: FrameRate::default(),
            color_format: ColorFormat::Yuv8,
            srgb_input: true,
            timecode_format: TimecodeFormat::None,
            capture_audio: false,
            audio_channels: AudioChannelLayout::Stereo,
            log_drop_frames: false,
            encode_timecode_in_texel: false,
            max_audio_frame_buffer: DEFAULT_MAX_BUFFER_DEPTH,
            max_video_frame_buffer: DEFAULT_MAX_BUFFER_DEPTH,
            use_time_synchronization: false,
            log_timecode: false,
            raw_dump_dir: std::env::temp_dir(),
        }
    }
}

fn to_u32(key: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid_option(key, format!("{value} is out of range")))
}

fn to_depth(key: &str, value: i64) -> Result<usize> {
    match usize::try_from(value) {
        Ok(depth) if depth >= 1 => Ok(depth),
        _ => Err(Error::invalid_option(
            key,
            format!("buffer depth must be at least 1, got {value}"),
        )),
    }
}

fn ordinal<T>(
    options: &MediaOptions,
    key: &str,
    default: T,
    parse: fn(i64) -> Option<T>,
) -> Result<T> {
    if !options.contains(key) {
        return Ok(default);
    }
    let value = options.get_int(key, 0)?;
    parse(value).ok_or_else(|| Error::invalid_option(key, format!("unknown value {value}")))
}

impl PlayerConfig {
    /// Reads and validates every known key, falling back to defaults.
    pub fn from_options(options: &MediaOptions) -> Result<Self> {
        let defaults = PlayerConfig::default();
        let numerator = i64::from(defaults.frame_rate.numerator);
        let denominator = i64::from(defaults.frame_rate.denominator);
        let config = PlayerConfig {
            device_index: to_u32(keys::DEVICE_INDEX, options.get_int(keys::DEVICE_INDEX, 0)?)?,
            capture_video: options.get_bool(keys::CAPTURE_VIDEO, defaults.capture_video)?,
            video_format: to_u32(keys::VIDEO_FORMAT, options.get_int(keys::VIDEO_FORMAT, 0)?)?,
            frame_rate: FrameRate::new(
                to_u32(
                    keys::FRAME_RATE_NUMERATOR,
                    options.get_int(keys::FRAME_RATE_NUMERATOR, numerator)?,
                )?,
                to_u32(
                    keys::FRAME_RATE_DENOMINATOR,
                    options.get_int(keys::FRAME_RATE_DENOMINATOR, denominator)?,
                )?,
            ),
            color_format: ordinal(
                options,
                keys::COLOR_FORMAT,
                defaults.color_format,
                ColorFormat::from_ordinal,
            )?,
            srgb_input: options.get_bool(keys::SRGB_INPUT, defaults.srgb_input)?,
            timecode_format: ordinal(
                options,
                keys::TIMECODE_FORMAT,
                defaults.timecode_format,
                TimecodeFormat::from_ordinal,
            )?,
            capture_audio: options.get_bool(keys::CAPTURE_AUDIO, defaults.capture_audio)?,
            audio_channels: ordinal(
                options,
                keys::AUDIO_CHANNELS,
                defaults.audio_channels,
                AudioChannelLayout::from_ordinal,
            )?,
            log_drop_frames: options.get_bool(keys::LOG_DROP_FRAMES, defaults.log_drop_frames)?,
            encode_timecode_in_texel: options
                .get_bool(keys::ENCODE_TIMECODE_IN_TEXEL, defaults.encode_timecode_in_texel)?,
            max_audio_frame_buffer: to_depth(
                keys::MAX_AUDIO_FRAME_BUFFER,
                options.get_int(keys::MAX_AUDIO_FRAME_BUFFER, DEFAULT_MAX_BUFFER_DEPTH as i64)?,
            )?,
            max_video_frame_buffer: to_depth(
                keys::MAX_VIDEO_FRAME_BUFFER,
                options.get_int(keys::MAX_VIDEO_FRAME_BUFFER, DEFAULT_MAX_BUFFER_DEPTH as i64)?,
            )?,
            use_time_synchronization: options
                .get_bool(keys::USE_TIME_SYNCHRONIZATION, defaults.use_time_synchronization)?,
            log_timecode: options.get_bool(keys::LOG_TIMECODE, defaults.log_timecode)?,
            raw_dump_dir: if options.contains(keys::RAW_DUMP_DIR) {
                PathBuf::from(options.get_string(keys::RAW_DUMP_DIR, "")?)
            } else {
                defaults.raw_dump_dir
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants `from_options` enforces.
    pub fn validate(&self) -> Result<()> {
        if !self.frame_rate.is_valid() {
            return Err(Error::invalid_option(
                keys::FRAME_RATE_NUMERATOR,
                format!(
                    "frame rate {}/{} is not valid",
                    self.frame_rate.numerator, self.frame_rate.denominator
                ),
            ));
        }
        if self.max_audio_frame_buffer == 0 {
            return Err(Error::invalid_option(
                keys::MAX_AUDIO_FRAME_BUFFER,
                "buffer depth must be at least 1",
            ));
        }
        if self.max_video_frame_buffer == 0 {
            return Err(Error::invalid_option(
                keys::MAX_VIDEO_FRAME_BUFFER,
                "buffer depth must be at least 1",
            ));
        }
        Ok(())
    }

    /// `true` when frames should carry a timecode.
    pub fn timecode_expected(&self) -> bool {
        self.timecode_format != TimecodeFormat::None
    }

    /// Burn-in is only effective with a timecode source.
    pub fn burn_in_enabled(&self) -> bool {
        self.timecode_expected() && self.encode_timecode_in_texel
    }

    /// Registration options for the SDK.
    pub fn channel_options(&self) -> InputChannelOptions {
        InputChannelOptions {
            callback_priority: CALLBACK_PRIORITY,
            read_video: self.capture_video,
            read_audio: self.capture_audio,
            format_info: FormatInfo {
                display_mode: self.video_format,
                frame_rate: self.frame_rate,
                ..Default::default()
            },
            pixel_format: self.color_format.pixel_format(),
            timecode_format: self.timecode_format.sdk_format(),
            number_of_audio_channel: self.audio_channels.channel_count(),
        }
    }

    /// Decoder behaviour for a channel opened at `url`.
    pub fn decoder_settings(&self, url: &str, clock: Arc<dyn Clock>) -> DecoderSettings {
        DecoderSettings {
            url: url.to_string(),
            device_index: self.device_index,
            frame_rate: self.frame_rate,
            timecode_expected: self.timecode_expected(),
            use_time_synchronization: self.use_time_synchronization,
            encode_timecode_in_texel: self.burn_in_enabled(),
            srgb_input: self.srgb_input,
            verify_drop_count: self.log_drop_frames,
            log_timecode: self.log_timecode,
            raw_dump_dir: self.raw_dump_dir.clone(),
            clock,
        }
    }
}

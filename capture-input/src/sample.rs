// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Decoded video pictures and PCM blocks.
//!
//! Both sample kinds copy out of the SDK's buffers, which are only valid for
//! the duration of one callback, and are recycled through [`crate::SamplePool`].

use std::time::Duration;

use capture_sdk::FrameRate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Timecode, pool::Recycle};

/// Bits per audio sample delivered by the card.
pub const AUDIO_BITS_PER_SAMPLE: u32 = 32;

/// Texture layout a renderer should use for a [`VideoSample`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 8-bit 4:2:2, UYVY byte order.
    #[default]
    CharUyvy,
    /// 10-bit 4:2:2, v210 packed.
    YuvV210,
    /// 8-bit BGRA.
    CharBgra,
}

/// Which part of the source frame a picture holds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The whole progressive frame.
    #[default]
    Progressive,
    /// Lines 0, 2, 4, … of an interlaced frame.
    Even,
    /// Lines 1, 3, 5, … of an interlaced frame.
    Odd,
}

/// Geometry and timing of a captured picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFrameDesc {
    /// Bytes per row in the source buffer.
    pub pitch: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in lines of the full source frame.
    pub height: u32,
    /// Layout of the pixel data.
    pub format: SampleFormat,
    /// Presentation time.
    pub time: Duration,
    /// Rate the picture was captured at.
    pub frame_rate: FrameRate,
    /// Timecode stamped on the picture, if any.
    pub timecode: Option<Timecode>,
    /// Pixel data is sRGB encoded.
    pub srgb: bool,
}

/// One decoded picture.
#[derive(Debug, Default)]
pub struct VideoSample {
    buffer: Vec<u8>,
    stride: u32,
    width: u32,
    height: u32,
    format: SampleFormat,
    time: Duration,
    frame_rate: FrameRate,
    timecode: Option<Timecode>,
    field: Field,
    srgb: bool,
}

impl VideoSample {
    /// Copies a progressive picture.
    pub fn initialize(&mut self, source: &[u8], desc: &VideoFrameDesc) -> Result<()> {
        let size = Self::validate(source, desc)?;
        self.buffer.clear();
        self.buffer.extend_from_slice(&source[..size]);
        self.set_metadata(desc, desc.height, Field::Progressive);
        Ok(())
    }

    /// Copies every other line of an interlaced frame, starting at line 0
    /// for [`Field::Even`] and line 1 for [`Field::Odd`].
    pub fn initialize_field(
        &mut self,
        field: Field,
        source: &[u8],
        desc: &VideoFrameDesc,
    ) -> Result<()> {
        let first_line = match field {
            Field::Even => 0,
            Field::Odd => 1,
            Field::Progressive => return self.initialize(source, desc),
        };
        Self::validate(source, desc)?;

        let pitch = desc.pitch as usize;
        let field_height = desc.height / 2;
        self.buffer.clear();
        self.buffer.reserve(pitch * field_height as usize);
        for line in (first_line..desc.height as usize).step_by(2).take(field_height as usize) {
            let start = line * pitch;
            self.buffer.extend_from_slice(&source[start..start + pitch]);
        }
        self.set_metadata(desc, field_height, field);
        Ok(())
    }

    fn validate(source: &[u8], desc: &VideoFrameDesc) -> Result<usize> {
        if desc.pitch == 0 || desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidSample(format!(
                "empty picture {}x{} with pitch {}",
                desc.width, desc.height, desc.pitch
            )));
        }
        let size = desc.pitch as usize * desc.height as usize;
        if source.len() < size {
            return Err(Error::InvalidSample(format!(
                "video buffer holds {} bytes, {} expected",
                source.len(),
                size
            )));
        }
        Ok(size)
    }

    fn set_metadata(&mut self, desc: &VideoFrameDesc, height: u32, field: Field) {
        self.stride = desc.pitch;
        self.width = desc.width;
        self.height = height;
        self.format = desc.format;
        self.time = desc.time;
        self.frame_rate = desc.frame_rate;
        self.timecode = desc.timecode;
        self.field = field;
        self.srgb = desc.srgb;
    }

    /// Pixel data, `stride * height` bytes.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of this picture; half the source height for a field.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Presentation time.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// How long the picture should stay on screen.
    pub fn duration(&self) -> Duration {
        self.frame_rate.as_interval()
    }

    pub fn timecode(&self) -> Option<Timecode> {
        self.timecode
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// `true` if the renderer must linearise the pixel data.
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }
}

impl Recycle for VideoSample {
    fn recycle(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        *self = Self {
            buffer,
            ..Default::default()
        };
    }
}

/// One block of interleaved 32-bit PCM.
#[derive(Debug, Default)]
pub struct AudioSample {
    buffer: Vec<i32>,
    channels: u32,
    sample_rate: u32,
    time: Duration,
    timecode: Option<Timecode>,
}

impl AudioSample {
    /// Copies interleaved little-endian `i32` samples out of `source`.
    ///
    /// Sample count is `source.len() / 4`; a trailing partial sample is
    /// ignored.
    pub fn initialize(
        &mut self,
        source: &[u8],
        channels: u32,
        sample_rate: u32,
        time: Duration,
        timecode: Option<Timecode>,
    ) -> Result<()> {
        if channels == 0 || sample_rate == 0 {
            return Err(Error::InvalidSample(format!(
                "audio block with {channels} channel(s) at {sample_rate} Hz"
            )));
        }
        self.buffer.clear();
        self.buffer.extend(
            source
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
        self.channels = channels;
        self.sample_rate = sample_rate;
        self.time = time;
        self.timecode = timecode;
        Ok(())
    }

    /// Interleaved samples.
    pub fn buffer(&self) -> &[i32] {
        &self.buffer
    }

    /// Total samples across all channels.
    pub fn sample_count(&self) -> usize {
        self.buffer.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.buffer.len() / self.channels as usize
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u32 {
        AUDIO_BITS_PER_SAMPLE
    }

    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.frames() as u64 * 1_000_000_000 / self.sample_rate as u64)
    }

    pub fn timecode(&self) -> Option<Timecode> {
        self.timecode
    }
}

impl Recycle for AudioSample {
    fn recycle(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        *self = Self {
            buffer,
            ..Default::default()
        };
    }
}

/// Layout of the audio most recently accepted from the card.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrackFormat {
    pub bits_per_sample: u32,
    pub channels: u32,
    pub sample_rate: u32,
}

// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! SMPTE-style timecodes decoded from hardware.
//!
//! The hardware hands over a linear frame count even for rates that need
//! field doubling, so a 50i source reports frames `0..=24` per second and the
//! driver derives the odd field's timecode as `frames + 1`.

use std::{fmt, time::Duration};

use capture_sdk::{FrameRate, HardwareTimecode};
use serde::{Deserialize, Serialize};

/// Hours, minutes, seconds and frame number, plus the drop-frame flag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
    /// Frame numbers 0 and 1 (0..=3 at 59.94) are skipped at the start of
    /// every minute not divisible by ten.
    pub drop_frame: bool,
}

impl Timecode {
    pub fn new(hours: u32, minutes: u32, seconds: u32, frames: u32, drop_frame: bool) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            frames,
            drop_frame,
        }
    }

    /// Builds a timecode from the hardware value, enabling drop-frame
    /// counting when `rate` calls for it.
    pub fn from_hardware(timecode: &HardwareTimecode, rate: &FrameRate) -> Self {
        Self::new(
            timecode.hours,
            timecode.minutes,
            timecode.seconds,
            timecode.frames,
            Self::is_drop_format_supported(rate),
        )
    }

    /// Returns `true` for the NTSC rates that use drop-frame numbering.
    pub fn is_drop_format_supported(rate: &FrameRate) -> bool {
        rate.denominator == 1001 && (rate.numerator == 30000 || rate.numerator == 60000)
    }

    /// Highest valid frame number plus one for a source at `rate`.
    ///
    /// Interlaced sources lose one because the odd field is stamped
    /// `frames + 1`.
    pub fn frame_limit(rate: &FrameRate, interlaced: bool) -> u32 {
        let limit = rate.rounded();
        if interlaced {
            limit.saturating_sub(1)
        } else {
            limit
        }
    }

    /// Returns `true` if `frames` is below [`Self::frame_limit`].
    pub fn is_frame_in_range(&self, rate: &FrameRate, interlaced: bool) -> bool {
        self.frames < Self::frame_limit(rate, interlaced)
    }

    /// The timecode of the following field. No carry into seconds; a frame
    /// number already at `u32::MAX` stays there.
    pub fn next_frame(&self) -> Self {
        Self {
            frames: self.frames.saturating_add(1),
            ..*self
        }
    }

    /// Converts to an absolute frame count at `rate`.
    pub fn to_frame_number(&self, rate: &FrameRate) -> u64 {
        let fps = rate.rounded() as u64;
        let total_minutes = self.hours as u64 * 60 + self.minutes as u64;
        let total_seconds = total_minutes * 60 + self.seconds as u64;
        let frame_number = total_seconds * fps + self.frames as u64;

        if self.drop_frame {
            let dropped_per_minute = fps / 15;
            let dropped = dropped_per_minute * (total_minutes - total_minutes / 10);
            frame_number.saturating_sub(dropped)
        } else {
            frame_number
        }
    }

    /// Converts to the time elapsed since `00:00:00:00` at `rate`.
    pub fn to_timespan(&self, rate: &FrameRate) -> Duration {
        if !rate.is_valid() {
            return Duration::ZERO;
        }
        let nanos = self.to_frame_number(rate) as u128
            * rate.denominator as u128
            * 1_000_000_000u128
            / rate.numerator as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl From<Timecode> for HardwareTimecode {
    fn from(value: Timecode) -> Self {
        HardwareTimecode {
            hours: value.hours,
            minutes: value.minutes,
            seconds: value.seconds,
            frames: value.frames,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, separator, self.frames
        )
    }
}

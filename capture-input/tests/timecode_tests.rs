// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Timecode arithmetic: frame limits, drop-frame numbering and timespans.

use std::time::Duration;

use capture_input::Timecode;
use capture_sdk::{FrameRate, HardwareTimecode};

const PAL: FrameRate = FrameRate {
    numerator: 25,
    denominator: 1,
};
const NTSC: FrameRate = FrameRate {
    numerator: 30000,
    denominator: 1001,
};

#[test]
fn frame_limit_follows_rounded_rate() {
    assert_eq!(Timecode::frame_limit(&PAL, false), 25);
    assert_eq!(Timecode::frame_limit(&NTSC, false), 30);
    assert_eq!(Timecode::frame_limit(&FrameRate::new(50, 1), true), 49);
    assert_eq!(Timecode::frame_limit(&FrameRate::new(60000, 1001), true), 59);
}

#[test]
fn out_of_range_frames_are_detected() {
    let last = Timecode::new(0, 0, 0, 24, false);
    assert!(last.is_frame_in_range(&PAL, false));
    assert!(!Timecode::new(0, 0, 0, 25, false).is_frame_in_range(&PAL, false));

    let rate = FrameRate::new(50, 1);
    assert!(Timecode::new(0, 0, 0, 48, false).is_frame_in_range(&rate, true));
    assert!(!Timecode::new(0, 0, 0, 49, false).is_frame_in_range(&rate, true));
}

#[test]
fn drop_frame_only_for_ntsc_rates() {
    assert!(Timecode::is_drop_format_supported(&NTSC));
    assert!(Timecode::is_drop_format_supported(&FrameRate::new(60000, 1001)));
    assert!(!Timecode::is_drop_format_supported(&PAL));
    assert!(!Timecode::is_drop_format_supported(&FrameRate::new(24000, 1001)));

    let hardware = HardwareTimecode {
        hours: 1,
        minutes: 2,
        seconds: 3,
        frames: 4,
    };
    assert!(Timecode::from_hardware(&hardware, &NTSC).drop_frame);
    assert!(!Timecode::from_hardware(&hardware, &PAL).drop_frame);
}

#[test]
fn drop_frame_numbering_skips_two_frames_per_minute() {
    // First frame after the skipped 00:01:00;00 and ;01.
    assert_eq!(Timecode::new(0, 1, 0, 2, true).to_frame_number(&NTSC), 1800);
    // Every tenth minute keeps its frames.
    assert_eq!(Timecode::new(0, 10, 0, 0, true).to_frame_number(&NTSC), 17982);
    assert_eq!(Timecode::new(0, 10, 0, 0, false).to_frame_number(&NTSC), 18000);
}

#[test]
fn timespan_at_integer_rate() {
    let one_hour = Timecode::new(1, 0, 0, 0, false);
    assert_eq!(one_hour.to_timespan(&PAL), Duration::from_secs(3600));

    let tc = Timecode::new(0, 0, 1, 5, false);
    assert_eq!(tc.to_timespan(&PAL), Duration::from_millis(1200));
    assert_eq!(tc.to_timespan(&FrameRate::new(0, 1)), Duration::ZERO);
}

#[test]
fn next_frame_does_not_carry() {
    let tc = Timecode::new(10, 0, 0, 24, false);
    let next = tc.next_frame();
    assert_eq!(next.frames, 25);
    assert_eq!(next.seconds, 0);
    assert_eq!(next.hours, 10);
}

#[test]
fn next_frame_saturates() {
    let tc = Timecode::new(0, 0, 0, u32::MAX, false);
    assert_eq!(tc.next_frame().frames, u32::MAX);
}

#[test]
fn timespan_past_u64_nanoseconds_saturates() {
    let tc = Timecode::new(u32::MAX, 0, 0, 0, false);
    let timespan = tc.to_timespan(&FrameRate::new(1, 1));
    assert_eq!(timespan, Duration::from_nanos(u64::MAX));
}

#[test]
fn display_marks_drop_frame() {
    assert_eq!(Timecode::new(1, 2, 3, 4, false).to_string(), "01:02:03:04");
    assert_eq!(Timecode::new(1, 2, 3, 4, true).to_string(), "01:02:03;04");
}

#[test]
fn converts_back_to_hardware() {
    let hardware: HardwareTimecode = Timecode::new(23, 59, 59, 29, true).into();
    assert_eq!(
        hardware,
        HardwareTimecode {
            hours: 23,
            minutes: 59,
            seconds: 59,
            frames: 29,
        }
    );
}

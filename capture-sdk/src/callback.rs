// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! The callback capability the SDK dispatches input events into.

use crate::{FormatInfo, FrameReceivedInfo};

/// Receives input events for one registered channel.
///
/// All methods are invoked on the SDK's capture thread. The SDK holds an
/// `Arc` clone of the implementor for the lifetime of the registration and
/// for any dispatch still in flight, so an invocation may arrive after
/// unregistration has returned.
pub trait InputEventCallback: Send + Sync {
    /// The channel finished (or failed) its asynchronous start-up.
    fn on_initialization_completed(&self, success: bool);

    /// The channel finished shutting down.
    fn on_shutdown_completed(&self);

    /// A frame, an audio block, or a no-signal heartbeat arrived.
    fn on_frame_received(&self, frame: &mut FrameReceivedInfo<'_>);

    /// The incoming signal changed format.
    fn on_frame_format_changed(&self, format: &FormatInfo);

    /// The odd field of an interlaced frame started.
    fn on_interlaced_odd_field_event(&self);
}

// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! # capture-sdk: the capture card SDK surface
//!
//! This crate describes the part of a professional video I/O card SDK that an
//! input driver consumes: channel and format descriptors, the per-frame event
//! payload, the callback capability the SDK dispatches into, and the channel
//! registration entry points.
//!
//! ## Overview
//!
//! ```text
//! ┌────────────┐ register_callback_for_channel ┌──────────────────────┐
//! │ CaptureSdk │ ◄──────────────────────────── │ Arc<dyn InputEvent…> │
//! └─────┬──────┘                               └──────────▲───────────┘
//!       │  SDK capture thread                             │
//!       └── on_initialization_completed / on_frame_received / … ─┘
//! ```
//!
//! Callbacks are reference counted with [`std::sync::Arc`]. The SDK keeps its
//! own clone for as long as a registration exists and may still hold a clone
//! while a dispatch is in flight after [`CaptureSdk::unregister_callback_for_channel`]
//! returns. Implementors of [`InputEventCallback`] must therefore tolerate late
//! invocations.
//!
//! ## Virtual device
//!
//! [`VirtualSdk`] is an in-process implementation of [`CaptureSdk`] used by
//! tests and demos. It never touches hardware; frames are pushed explicitly
//! with [`VirtualSdk::deliver_frame`].
//!
//! ## Thread Safety
//!
//! - [`CaptureSdk`] and [`InputEventCallback`] are `Send + Sync`
//! - [`FrameReceivedInfo`] borrows SDK-owned buffers and is only valid for the
//!   duration of one callback

mod callback;
mod error;
mod registry;
mod types;
mod virtual_device;

pub use callback::InputEventCallback;
pub use error::{Error, Result};
pub use registry::{CaptureSdk, UniqueIdentifier};
pub use types::*;
pub use virtual_device::{SyntheticFrame, VirtualSdk};

// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Channel registration entry points.

use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::{ChannelInfo, InputChannelOptions, InputEventCallback, Result};

/// Token returned by a successful registration.
///
/// Required to unregister the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueIdentifier(Uuid);

impl UniqueIdentifier {
    /// Creates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UniqueIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UniqueIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The SDK entry points an input driver depends on.
///
/// Device enumeration and runtime start-up are the SDK's business; the driver
/// only asks whether they succeeded.
pub trait CaptureSdk: Send + Sync {
    /// Returns `true` once the vendor runtime is loaded and initialised.
    fn is_initialized(&self) -> bool;

    /// Returns `true` if cards may be used in the current execution context.
    fn can_use_card(&self) -> bool;

    /// Registers `callback` for `channel`.
    ///
    /// The SDK keeps a clone of `callback` until the registration is removed
    /// and every in-flight dispatch has returned. Events may be dispatched
    /// before this call returns.
    fn register_callback_for_channel(
        &self,
        channel: &ChannelInfo,
        options: &InputChannelOptions,
        callback: Arc<dyn InputEventCallback>,
    ) -> Result<UniqueIdentifier>;

    /// Removes a registration.
    fn unregister_callback_for_channel(
        &self,
        channel: &ChannelInfo,
        identifier: UniqueIdentifier,
    ) -> Result<()>;
}

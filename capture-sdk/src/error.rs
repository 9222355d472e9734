// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for SDK registration calls.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by the capture SDK.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The SDK runtime has not been initialised on this machine.
    #[error("Capture runtime is not initialized")]
    NotInitialized,

    /// No device exists at the requested index.
    #[error("No capture device at index {device_index}")]
    DeviceNotFound {
        /// Requested device index.
        device_index: u32,
    },

    /// Another callback is already registered for this channel.
    #[error("Channel {device_index} is already in use")]
    ChannelBusy {
        /// Device index of the busy channel.
        device_index: u32,
    },

    /// The registration token is not known to the SDK.
    #[error("Unknown registration")]
    UnknownRegistration,

    /// The SDK refused the channel options.
    #[error("Registration rejected: {0}")]
    Rejected(String),
}

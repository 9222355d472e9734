// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for capture input operations.
//!
//! Only set-up failures are errors. Signal loss, format changes and buffer
//! overflow are reported through the capture state and the log, never as an
//! `Err`.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while setting up or feeding a capture channel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The vendor runtime is not loaded or failed to start.
    #[error("Capture runtime is not initialized")]
    RuntimeNotInitialized,

    /// Cards may not be used in this execution context.
    #[error("Capture card cannot be used in this context")]
    CardUnavailable,

    /// The SDK refused to register a callback for the channel.
    #[error("Failed to register input channel {device_index}: {source}")]
    RegistrationFailed {
        /// Device index of the channel.
        device_index: u32,
        /// SDK-level reason.
        #[source]
        source: capture_sdk::Error,
    },

    /// A hardware buffer could not be turned into a sample.
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// Writing a diagnostic file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error for failures not covered above.
    #[error("Other error: {0}")]
    Other(String),
}

// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the player facade.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors returned by [`crate::CapturePlayer`] and the option parsers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Availability or registration failure from the input layer.
    #[error(transparent)]
    Input(#[from] capture_input::Error),

    /// An option was missing a usable value.
    #[error("Invalid option '{key}': {reason}")]
    InvalidOption {
        /// Option key as passed by the host.
        key: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// A configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_option(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidOption {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

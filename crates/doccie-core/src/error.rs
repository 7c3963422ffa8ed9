// SPDX-License-Identifier: Apache-2.0

//! Error types for the Doccie client.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use thiserror::Error;

/// Errors that can occur during Doccie operations.
#[derive(Error, Debug)]
pub enum DoccieError {
    /// OAuth code exchange or profile fetch failed. The session has been cleared.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error message.
        message: String,
    },

    /// No live session - the user needs to run `doccie auth login`.
    #[error("Authentication required - run `doccie auth login` first")]
    NotAuthenticated,

    /// The backend rejected the stored credential. The session has been cleared.
    #[error("Session expired or revoked by the backend")]
    Unauthorized,

    /// A read or write against the backend failed.
    #[error("{message}")]
    Fetch {
        /// Error message (backend `Message`/`detail` when available).
        message: String,
        /// HTTP status code, if a response was received.
        status: Option<u16>,
    },

    /// A local precondition failed; no request was made.
    #[error("{message}")]
    Validation {
        /// Error message.
        message: String,
    },

    /// Configuration file error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Persisted session storage could not be written or removed.
    #[error("Session storage error: {message}")]
    Storage {
        /// Error message.
        message: String,
    },

    /// Network/HTTP error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Keyring/credential storage error.
    #[cfg(feature = "keyring")]
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl DoccieError {
    /// Shorthand for a [`DoccieError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        DoccieError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`DoccieError::Fetch`] without a status code.
    pub fn fetch(message: impl Into<String>) -> Self {
        DoccieError::Fetch {
            message: message.into(),
            status: None,
        }
    }

    /// Returns `true` if this error means the session is gone.
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            DoccieError::Auth { .. } | DoccieError::NotAuthenticated | DoccieError::Unauthorized
        )
    }
}

impl From<config::ConfigError> for DoccieError {
    fn from(err: config::ConfigError) -> Self {
        DoccieError::Config {
            message: err.to_string(),
        }
    }
}

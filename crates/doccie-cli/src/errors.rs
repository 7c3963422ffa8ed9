// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `DoccieError` and appends a hint for the
//! terminal. The library keeps structured error data; presentation lives here.

use std::fmt::Write;

use anyhow::Error;
use doccie_core::error::DoccieError;

/// Formats an error for CLI display with helpful hints.
///
/// If the error is not a `DoccieError`, returns the original error message.
pub fn format_error(error: &Error) -> String {
    let Some(doccie_err) = error.downcast_ref::<DoccieError>() else {
        return error.to_string();
    };

    match doccie_err {
        DoccieError::NotAuthenticated => doccie_err.to_string(),
        DoccieError::Unauthorized => {
            format!("{doccie_err}\n\nTip: Run `doccie auth login` to sign in again.")
        }
        DoccieError::Auth { .. } => {
            format!("{doccie_err}\n\nTip: Run `doccie auth login` to try again.")
        }
        DoccieError::Fetch { message, status } => {
            let mut msg = message.clone();
            if let Some(code) = status {
                let _ = write!(msg, " (HTTP {code})");
            }
            msg
        }
        DoccieError::Validation { .. } => doccie_err.to_string(),
        DoccieError::Config { message } => {
            let mut msg = format!(
                "{doccie_err}\n\nTip: Check your config file at {}",
                doccie_core::config_file_path().display()
            );
            if message.contains("client_id") {
                msg.push_str(" or set DOCCIE_OAUTH__CLIENT_ID.");
            }
            msg
        }
        DoccieError::Storage { .. } => {
            format!(
                "{doccie_err}\n\nTip: Check that {} is writable.",
                doccie_core::data_dir().display()
            )
        }
        DoccieError::Network(_) => format!(
            "{doccie_err}\n\nTip: Check that the Doccie backend is reachable (`api.base_url` or --api-url)."
        ),
        DoccieError::Keyring(_) => format!(
            "{doccie_err}\n\nTip: Your system keyring may be locked. Unlock it or set `session.backend = \"file\"`."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_not_authenticated_error() {
        let formatted = format_error(&anyhow::Error::new(DoccieError::NotAuthenticated));

        assert!(formatted.contains("Authentication required"));
        assert!(formatted.contains("doccie auth login"));
    }

    #[test]
    fn test_format_unauthorized_error() {
        let formatted = format_error(&anyhow::Error::new(DoccieError::Unauthorized));

        assert!(formatted.contains("expired or revoked"));
        assert!(formatted.contains("Tip: Run `doccie auth login`"));
    }

    #[test]
    fn test_format_fetch_error_with_status() {
        let error = DoccieError::Fetch {
            message: "Failed to fetch repositories".to_string(),
            status: Some(400),
        };
        let formatted = format_error(&anyhow::Error::new(error));

        assert_eq!(formatted, "Failed to fetch repositories (HTTP 400)");
    }

    #[test]
    fn test_format_fetch_error_without_status() {
        let formatted = format_error(&anyhow::Error::new(DoccieError::fetch("Malformed body")));

        assert_eq!(formatted, "Malformed body");
    }

    #[test]
    fn test_format_config_error_mentions_client_id_env() {
        let error = DoccieError::Config {
            message: "oauth.client_id is not set".to_string(),
        };
        let formatted = format_error(&anyhow::Error::new(error));

        assert!(formatted.contains("config.toml"));
        assert!(formatted.contains("DOCCIE_OAUTH__CLIENT_ID"));
    }

    #[test]
    fn test_format_error_through_context() {
        let error = anyhow::Error::new(DoccieError::validation("Please enter a valid backend path"))
            .context("Failed to activate octo/alpha");
        let formatted = format_error(&error);

        assert_eq!(formatted, "Please enter a valid backend path");
    }

    #[test]
    fn test_format_non_doccie_error() {
        let error = anyhow::anyhow!("Some generic error");
        let formatted = format_error(&error);

        assert_eq!(formatted, "Some generic error");
    }
}

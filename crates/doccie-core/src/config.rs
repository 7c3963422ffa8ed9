// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the Doccie client.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `DOCCIE_`)
//! 2. Config file: `~/.config/doccie/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Point the client at a staging backend
//! DOCCIE_API__BASE_URL=https://staging.doccie.dev doccie repo list
//! ```

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::DoccieError;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend API settings.
    pub api: ApiConfig,
    /// OAuth provider settings.
    pub oauth: OAuthConfig,
    /// Session persistence settings.
    pub session: SessionConfig,
    /// UI preferences.
    pub ui: UiConfig,
}

/// Backend API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Doccie backend (no trailing `/api`).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// OAuth provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// OAuth App client ID registered with the provider.
    pub client_id: String,
    /// Redirect URI registered with the OAuth App.
    ///
    /// The CLI listens on this address for the authorization callback.
    pub redirect_uri: String,
    /// Provider authorization endpoint.
    pub authorize_url: String,
    /// Space-separated scopes requested on every login.
    pub scopes: String,
    /// How long to wait for the browser callback, in seconds.
    pub callback_timeout_seconds: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: "http://127.0.0.1:5173/".to_string(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            scopes: "repo admin:repo_hook read:user".to_string(),
            callback_timeout_seconds: 300,
        }
    }
}

/// Where the session records are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// JSON files under the data directory.
    #[default]
    File,
    /// System keyring (requires the `keyring` feature).
    Keyring,
}

/// Session persistence settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage backend for the session records.
    pub backend: SessionBackendKind,
}

/// UI preferences.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Enable colored output.
    pub color: bool,
    /// Ask before removing the webhook of a monitored repository.
    pub confirm_before_deactivate: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: true,
            confirm_before_deactivate: true,
        }
    }
}

/// Returns the Doccie configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/doccie`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("doccie");
    }
    dirs::home_dir()
        .expect("Could not determine home directory - is HOME set?")
        .join(".config")
        .join("doccie")
}

/// Returns the Doccie data directory.
///
/// Respects the `XDG_DATA_HOME` environment variable if set,
/// otherwise defaults to `~/.local/share/doccie`.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME")
        && !xdg_data.is_empty()
    {
        return PathBuf::from(xdg_data).join("doccie");
    }
    dirs::home_dir()
        .expect("Could not determine home directory - is HOME set?")
        .join(".local")
        .join("share")
        .join("doccie")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `DOCCIE_` and double underscore
/// for nested keys (e.g., `DOCCIE_OAUTH__CLIENT_ID`).
///
/// # Errors
///
/// Returns `DoccieError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, DoccieError> {
    let config_path = config_file_path();

    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::with_name(config_path.to_string_lossy().as_ref()).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("DOCCIE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        let config = load_config().expect("should load with defaults");

        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(
            config.oauth.authorize_url,
            "https://github.com/login/oauth/authorize"
        );
        assert_eq!(config.oauth.scopes, "repo admin:repo_hook read:user");
        assert_eq!(config.session.backend, SessionBackendKind::File);
        assert!(config.ui.confirm_before_deactivate);
    }

    #[test]
    fn test_config_dir_exists() {
        let dir = config_dir();
        assert!(dir.ends_with("doccie"));
    }

    #[test]
    fn test_data_dir_exists() {
        let dir = data_dir();
        assert!(dir.ends_with("doccie"));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_config_from_toml() {
        let config_str = r#"
[api]
base_url = "https://api.doccie.dev"

[oauth]
client_id = "Iv1.abc"
redirect_uri = "http://127.0.0.1:9999/callback"

[session]
backend = "keyring"
"#;

        let config = Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Toml))
            .build()
            .expect("should build config");

        let app_config: AppConfig = config.try_deserialize().expect("should deserialize");

        assert_eq!(app_config.api.base_url, "https://api.doccie.dev");
        assert_eq!(app_config.api.timeout_seconds, 30);
        assert_eq!(app_config.oauth.client_id, "Iv1.abc");
        assert_eq!(
            app_config.oauth.redirect_uri,
            "http://127.0.0.1:9999/callback"
        );
        assert_eq!(app_config.session.backend, SessionBackendKind::Keyring);
    }

    #[test]
    fn test_config_rejects_unknown_backend() {
        let config_str = r#"
[session]
backend = "cookie-jar"
"#;

        let config = Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Toml))
            .build()
            .expect("should build config");

        let result: Result<AppConfig, _> = config.try_deserialize();
        assert!(result.is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the Doccie backend.
//!
//! Knows the endpoint paths, the base URL and the transport timeout, and maps
//! non-2xx responses onto [`DoccieError::Fetch`]. It does not know about
//! sessions; protected calls go through
//! [`AuthGateway::send_protected`](crate::auth::AuthGateway::send_protected).

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::DoccieError;

/// Backend endpoint paths.
pub mod endpoints {
    /// `GET ?code=`: exchange an OAuth code for a credential.
    pub const ACCESS_TOKEN: &str = "/api/auth/access-token";
    /// `GET`, bearer: profile of the signed-in user.
    pub const USER_DATA: &str = "/api/auth/user-data";
    /// `GET`, bearer: repositories visible to the user.
    pub const REPO_LIST: &str = "/api/repo/list";
    /// `POST`, token in body: generated documentation.
    pub const READ_DOCS: &str = "/api/repo/read_docs";
    /// `POST`, bearer: start monitoring a repository.
    pub const CREATE_WEBHOOK: &str = "/api/github/create-webhook";
    /// `DELETE`, bearer: stop monitoring a repository.
    pub const DELETE_WEBHOOK: &str = "/api/github/delete-webhook";

    /// `GET`, bearer: details of one repository.
    #[must_use]
    pub fn repo_details(id: u64) -> String {
        format!("/api/repo/{id}")
    }
}

/// Thin wrapper over `reqwest` bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client from configuration.
    pub fn new(config: &ApiConfig) -> crate::Result<Self> {
        Self::with_base_url(
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Creates a client for `base_url` with the given request timeout.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| DoccieError::Config {
            message: format!("Invalid api.base_url '{base_url}': {e}"),
        })?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("doccie/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> crate::Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).map_err(|e| DoccieError::Config {
            message: format!("Invalid endpoint URL '{raw}': {e}"),
        })
    }

    /// Starts a request against an endpoint path.
    pub fn request(&self, method: Method, path: &str) -> crate::Result<RequestBuilder> {
        let url = self.url(path)?;
        debug!(%method, %url, "Preparing backend request");
        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json"))
    }
}

/// Extracts the human-readable message from a backend error body.
///
/// The backend uses `Message` for its own envelopes and `detail` for
/// framework-level errors.
#[must_use]
pub fn backend_message(body: &serde_json::Value) -> Option<String> {
    ["Message", "message", "detail"]
        .iter()
        .find_map(|key| body.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
}

/// Turns a non-2xx response into [`DoccieError::Fetch`].
pub async fn expect_success(response: Response) -> crate::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .as_ref()
        .and_then(backend_message)
        .unwrap_or_else(|| {
            format!(
                "Request failed (HTTP {} {})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )
        });

    debug!(status = status.as_u16(), %message, "Backend returned an error");
    Err(DoccieError::Fetch {
        message,
        status: Some(status.as_u16()),
    })
}

/// Checks the status and decodes a JSON body.
///
/// A body that does not match `T` is reported as a fetch error, not a
/// network error.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> crate::Result<T> {
    let response = expect_success(response).await?;
    let status = response.status().as_u16();
    let url = response.url().path().to_string();
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| DoccieError::Fetch {
        message: format!("Malformed response from {url}: {e}"),
        status: Some(status),
    })
}

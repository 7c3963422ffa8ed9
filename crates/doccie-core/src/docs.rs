// SPDX-License-Identifier: Apache-2.0

//! Generated API documentation.
//!
//! The backend keeps an OpenAPI document and a Mermaid dependency diagram on
//! a `doccie` branch of each monitored repository. This module fetches them,
//! tells "not generated yet" apart from failures, and exports the document.

use std::future::Future;

use anyhow::Context;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::{backend_message, endpoints};
use crate::auth::AuthGateway;
use crate::error::DoccieError;

/// Message a legacy backend sends (with HTTP 200) when no documentation exists.
pub const NOT_FOUND_SENTINEL: &str = "Documentation files not found in doccie branch";

/// Default file name for the exported dependency diagram.
pub const DIAGRAM_FILE_NAME: &str = "dependency.mmd";

const FETCH_FAILED: &str = "Failed to fetch documentation";

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// OpenAPI document plus optional dependency diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentationBundle {
    /// OpenAPI document.
    pub spec: Value,
    /// Mermaid source of the dependency diagram.
    pub dependency_diagram: Option<String>,
}

/// One operation of the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Upper-case HTTP method.
    pub method: String,
    /// Path template.
    pub path: String,
    /// `summary`, if the operation has one.
    pub summary: Option<String>,
}

impl DocumentationBundle {
    /// Builds a bundle from the backend payload.
    ///
    /// `data` may be the document itself or YAML/JSON text.
    pub fn from_payload(data: Value, dependency: Option<Value>) -> crate::Result<Self> {
        let spec = match data {
            Value::Object(_) => data,
            Value::String(text) => parse_document(&text)?,
            other => {
                return Err(DoccieError::fetch(format!(
                    "Unexpected documentation payload: {other}"
                )));
            }
        };

        let dependency_diagram = match dependency {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        };

        Ok(Self {
            spec,
            dependency_diagram,
        })
    }

    /// `info.title` of the document.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.spec.pointer("/info/title").and_then(Value::as_str)
    }

    /// `info.version` of the document.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.spec.pointer("/info/version").and_then(Value::as_str)
    }

    /// Operations under `paths`, grouped by path.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        let Some(paths) = self.spec.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };

        paths
            .iter()
            .flat_map(|(path, item)| {
                HTTP_METHODS.iter().filter_map(move |method| {
                    let op = item.get(*method)?;
                    Some(Operation {
                        method: method.to_uppercase(),
                        path: path.clone(),
                        summary: op.get("summary").and_then(Value::as_str).map(str::to_string),
                    })
                })
            })
            .collect()
    }

    /// Pretty-printed JSON of the document.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(&self.spec).context("Failed to serialize documentation to JSON")
    }

    /// YAML of the document.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_saphyr::to_string(&self.spec).context("Failed to serialize documentation to YAML")
    }

    /// Serializes the document in `format`.
    pub fn export(&self, format: ExportFormat) -> anyhow::Result<String> {
        match format {
            ExportFormat::Yaml => self.to_yaml(),
            ExportFormat::Json => self.to_json(),
        }
    }
}

fn parse_document(text: &str) -> crate::Result<Value> {
    // YAML is a superset of JSON, one parser covers both
    let value: Value = serde_saphyr::from_str(text)
        .map_err(|e| DoccieError::fetch(format!("Malformed documentation: {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(DoccieError::fetch(
            "Malformed documentation: expected a mapping at the top level",
        ))
    }
}

/// Export format for the OpenAPI document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// YAML.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl ExportFormat {
    /// Default file name for this format.
    #[must_use]
    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportFormat::Yaml => "api-documentation.yaml",
            ExportFormat::Json => "api-documentation.json",
        }
    }
}

/// Result of a documentation fetch that reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DocsOutcome {
    /// Nothing generated yet. Informational.
    NotFound,
    /// Documentation is available.
    Bundle(DocumentationBundle),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DocsStatus {
    Ok,
    NotFound,
    Error,
}

#[derive(Debug, Serialize)]
struct ReadDocsRequest<'a> {
    full_name: &'a str,
    access_token: &'a str,
}

/// Decides what a `read_docs` response means.
///
/// A `status` tag in the body wins, then HTTP 404. Bodies without a tag are
/// checked for [`NOT_FOUND_SENTINEL`]. A success without `data` is a failure.
pub fn classify(status: u16, body: &str) -> crate::Result<DocsOutcome> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let tag = parsed
        .as_ref()
        .and_then(|v| v.get("status"))
        .and_then(|v| DocsStatus::deserialize(v).ok());
    let message = parsed.as_ref().and_then(backend_message);

    let failure = |default: &str| DoccieError::Fetch {
        message: message.clone().unwrap_or_else(|| default.to_string()),
        status: Some(status),
    };

    match tag {
        Some(DocsStatus::NotFound) => return Ok(DocsOutcome::NotFound),
        None if status == 404 => return Ok(DocsOutcome::NotFound),
        _ => {}
    }

    if !(200..300).contains(&status) || matches!(tag, Some(DocsStatus::Error)) {
        return Err(failure(FETCH_FAILED));
    }

    let Some(mut body) = parsed else {
        return Err(failure("Malformed documentation response"));
    };

    if tag.is_none() && message.as_deref() == Some(NOT_FOUND_SENTINEL) {
        debug!("Legacy not-found message");
        return Ok(DocsOutcome::NotFound);
    }

    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => {
            let dependency = body.get_mut("dependency").map(Value::take);
            DocumentationBundle::from_payload(data, dependency).map(DocsOutcome::Bundle)
        }
        _ => Err(failure(FETCH_FAILED)),
    }
}

/// Fetches the documentation of `full_name`.
///
/// The backend takes the access token in the body rather than the header.
#[instrument(skip(gateway))]
pub async fn fetch_documentation(
    gateway: &AuthGateway,
    full_name: &str,
) -> crate::Result<DocsOutcome> {
    if full_name.trim().is_empty() {
        return Err(DoccieError::validation("Invalid repository details"));
    }

    let response = gateway
        .send_protected(|api, credential| {
            Ok(api
                .request(Method::POST, endpoints::READ_DOCS)?
                .json(&ReadDocsRequest {
                    full_name,
                    access_token: credential.access_token.expose_secret(),
                }))
        })
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;
    classify(status, &body)
}

/// Load state of the documentation view.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DocsState {
    /// The view has not been opened.
    #[default]
    NotRequested,
    /// A fetch is in flight.
    Loading,
    /// The backend answered.
    Ready(DocsOutcome),
    /// The fetch failed with this message.
    Failed(String),
}

/// Documentation fetched at most once per owner.
///
/// A finished fetch, successful or not, is kept. Session errors are not kept
/// because the owner cannot continue without logging in again.
#[derive(Debug, Default)]
pub struct DocsCell {
    state: DocsState,
    fetches: u32,
}

impl DocsCell {
    /// Creates a cell in [`DocsState::NotRequested`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &DocsState {
        &self.state
    }

    /// Number of fetches started.
    #[must_use]
    pub fn fetch_count(&self) -> u32 {
        self.fetches
    }

    /// Runs `fetch` unless a result is already held.
    ///
    /// A cell left in `Loading` belongs to a fetch that was dropped before it
    /// finished, so it fetches again.
    pub async fn get_or_fetch<F, Fut>(&mut self, fetch: F) -> crate::Result<&DocsState>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = crate::Result<DocsOutcome>>,
    {
        if matches!(self.state, DocsState::Ready(_) | DocsState::Failed(_)) {
            return Ok(&self.state);
        }

        self.state = DocsState::Loading;
        self.fetches += 1;
        match fetch().await {
            Ok(outcome) => self.state = DocsState::Ready(outcome),
            Err(e) if e.is_session_error() => {
                self.state = DocsState::NotRequested;
                return Err(e);
            }
            Err(e) => self.state = DocsState::Failed(e.to_string()),
        }
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC_YAML: &str = "openapi: 3.0.0\ninfo:\n  title: Pets\n  version: '1.0'\npaths:\n  /pets:\n    get:\n      summary: List pets\n    post:\n      summary: Create pet\n  /pets/{id}:\n    delete: {}\n";

    fn ok_body() -> String {
        serde_json::json!({
            "Message": "Documentation fetched",
            "data": SPEC_YAML,
            "dependency": "graph TD\n  A --> B"
        })
        .to_string()
    }

    fn bundle() -> DocumentationBundle {
        match classify(200, &ok_body()).unwrap() {
            DocsOutcome::Bundle(bundle) => bundle,
            DocsOutcome::NotFound => panic!("expected a bundle"),
        }
    }

    #[test]
    fn yaml_string_payload_becomes_document() {
        let bundle = bundle();
        assert_eq!(bundle.title(), Some("Pets"));
        assert_eq!(bundle.version(), Some("1.0"));
        assert_eq!(
            bundle.dependency_diagram.as_deref(),
            Some("graph TD\n  A --> B")
        );
    }

    #[test]
    fn object_payload_is_used_as_is() {
        let body = serde_json::json!({
            "status": "ok",
            "data": {"openapi": "3.1.0", "info": {"title": "Inline"}},
            "dependency": null
        });
        let outcome = classify(200, &body.to_string()).unwrap();
        let DocsOutcome::Bundle(bundle) = outcome else {
            panic!("expected a bundle");
        };
        assert_eq!(bundle.title(), Some("Inline"));
        assert!(bundle.dependency_diagram.is_none());
    }

    #[test]
    fn operations_are_listed_per_path() {
        let ops = bundle().operations();
        let listed: Vec<String> = ops
            .iter()
            .map(|op| format!("{} {}", op.method, op.path))
            .collect();
        assert_eq!(listed, vec!["GET /pets", "POST /pets", "DELETE /pets/{id}"]);
        assert_eq!(ops[0].summary.as_deref(), Some("List pets"));
        assert!(ops[2].summary.is_none());
    }

    #[test]
    fn legacy_sentinel_is_not_found() {
        let body = serde_json::json!({ "Message": NOT_FOUND_SENTINEL }).to_string();
        assert_eq!(classify(200, &body).unwrap(), DocsOutcome::NotFound);
    }

    #[test]
    fn status_tag_wins_over_sentinel() {
        let body = serde_json::json!({
            "status": "error",
            "Message": NOT_FOUND_SENTINEL
        })
        .to_string();
        assert!(classify(200, &body).is_err());

        let body = serde_json::json!({ "status": "not_found", "Message": "nothing yet" }).to_string();
        assert_eq!(classify(200, &body).unwrap(), DocsOutcome::NotFound);
    }

    #[test]
    fn http_404_is_not_found() {
        assert_eq!(classify(404, "").unwrap(), DocsOutcome::NotFound);
    }

    #[test]
    fn success_without_data_is_error() {
        let body = serde_json::json!({ "Message": "Error reading files" }).to_string();
        let err = classify(200, &body).unwrap_err();
        assert_eq!(err.to_string(), "Error reading files");
    }

    #[test]
    fn server_error_uses_backend_message() {
        let body = serde_json::json!({ "detail": "GitHub unavailable" }).to_string();
        let err = classify(502, &body).unwrap_err();
        assert!(matches!(
            err,
            DoccieError::Fetch {
                status: Some(502),
                ..
            }
        ));
        assert_eq!(err.to_string(), "GitHub unavailable");
    }

    #[test]
    fn export_formats() {
        let bundle = bundle();
        let json = bundle.export(ExportFormat::Json).unwrap();
        let reparsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, bundle.spec);

        let yaml = bundle.export(ExportFormat::Yaml).unwrap();
        assert!(yaml.contains("title: Pets"));
        assert_eq!(ExportFormat::Json.default_file_name(), "api-documentation.json");
        assert_eq!(ExportFormat::Yaml.default_file_name(), "api-documentation.yaml");
    }

    #[tokio::test]
    async fn cell_fetches_once() {
        let mut cell = DocsCell::new();
        cell.get_or_fetch(|| async { Ok(DocsOutcome::NotFound) })
            .await
            .unwrap();
        let state = cell
            .get_or_fetch(|| async { Err(DoccieError::fetch("refetched")) })
            .await
            .unwrap();
        assert_eq!(state, &DocsState::Ready(DocsOutcome::NotFound));
        assert_eq!(cell.fetch_count(), 1);
    }

    #[tokio::test]
    async fn cell_keeps_failures() {
        let mut cell = DocsCell::new();
        cell.get_or_fetch(|| async { Err(DoccieError::fetch("boom")) })
            .await
            .unwrap();
        assert_eq!(cell.state(), &DocsState::Failed("boom".to_string()));

        cell.get_or_fetch(|| async { Ok(DocsOutcome::NotFound) })
            .await
            .unwrap();
        assert_eq!(cell.fetch_count(), 1);
    }

    #[tokio::test]
    async fn cell_does_not_keep_session_errors() {
        let mut cell = DocsCell::new();
        let err = cell
            .get_or_fetch(|| async { Err(DoccieError::Unauthorized) })
            .await
            .unwrap_err();
        assert!(matches!(err, DoccieError::Unauthorized));
        assert_eq!(cell.state(), &DocsState::NotRequested);
    }
}

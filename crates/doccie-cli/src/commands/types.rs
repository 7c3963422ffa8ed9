// SPDX-License-Identifier: Apache-2.0

//! Result types returned by command handlers.
//!
//! These types allow command handlers to return data instead of printing
//! directly, improving testability and separation of concerns.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use doccie_core::docs::Operation;
use doccie_core::{RepoStatus, Repository, RepositoryDetails};
use serde::Serialize;

/// Result from the auth status command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthStatusResult {
    /// Whether a session is stored.
    pub authenticated: bool,
    /// Display name of the signed-in user.
    pub user: Option<String>,
    /// GitHub login of the signed-in user.
    pub login: Option<String>,
    /// When the access token was obtained.
    pub signed_in_at: Option<DateTime<Utc>>,
    /// Where the session records live.
    pub storage: String,
}

/// Result from the auth login command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResult {
    /// Display name of the signed-in user.
    pub user: String,
    /// GitHub login, if reported.
    pub login: Option<String>,
    /// True when a valid session existed and no sign-in was performed.
    pub already_signed_in: bool,
}

/// Result from the auth logout command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LogoutResult {
    /// Whether a session was stored before logging out.
    pub was_signed_in: bool,
}

/// Result from the repo list command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RepoListResult {
    /// Repositories matching the filter, in backend order.
    pub repos: Vec<Repository>,
    /// Number of repositories before filtering.
    pub total: usize,
    /// Search text that was applied.
    pub search: Option<String>,
    /// Status filter that was applied (empty means all).
    pub statuses: Vec<RepoStatus>,
}

/// Result from the repo show command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RepoDetailResult {
    /// Listing entry, including monitoring status.
    pub repository: Repository,
    /// Metadata and directory tree.
    pub details: RepositoryDetails,
}

/// What a monitoring command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoAction {
    /// Webhook installed.
    Activated,
    /// Webhook removed.
    Deactivated,
    /// The user declined the confirmation.
    Cancelled,
}

/// Result from the repo activate and deactivate commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RepoActionResult {
    /// Repository state after the command.
    pub repository: Repository,
    /// Outcome.
    pub action: RepoAction,
}

/// Result from the docs show command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DocsResult {
    /// `owner/name`.
    pub repository: String,
    /// False when nothing has been generated yet.
    pub available: bool,
    /// `info.title` of the document.
    pub title: Option<String>,
    /// `info.version` of the document.
    pub version: Option<String>,
    /// Documented operations.
    pub operations: Vec<Operation>,
    /// Whether a dependency diagram was generated.
    pub has_diagram: bool,
}

/// Result from the docs export and diagram commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportResult {
    /// `owner/name`.
    pub repository: String,
    /// File written.
    pub path: PathBuf,
    /// `yaml`, `json` or `mermaid`.
    pub format: &'static str,
    /// Bytes written.
    pub bytes: usize,
}

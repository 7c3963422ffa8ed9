// SPDX-License-Identifier: Apache-2.0

//! Single repository view: details, webhook monitoring and documentation.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::Repository;
use crate::api::{self, endpoints};
use crate::auth::AuthGateway;
use crate::docs::{DocsCell, DocsOutcome, DocsState, fetch_documentation};
use crate::error::DoccieError;
use crate::notify::Notifier;

/// Repository metadata with its directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDetails {
    /// Provider repository id.
    pub id: u64,
    /// Short name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Default branch.
    #[serde(default)]
    pub default_branch: Option<String>,
    /// Public or private.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Top-level entries of the default branch.
    #[serde(default)]
    pub directory_structure: Vec<TreeNode>,
}

impl RepositoryDetails {
    /// Number of files in the whole tree.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.directory_structure.iter().map(TreeNode::file_count).sum()
    }
}

/// Repository visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone.
    Public,
    /// Visible to collaborators only.
    Private,
}

/// Entry of the directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// File or directory name.
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    /// File or directory.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Entries of a directory. Always empty for files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(TreeNode::file_count).sum(),
        }
    }
}

/// Kind of tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    #[serde(alias = "dir")]
    Directory,
}

/// Body of the webhook create/delete requests.
///
/// The backend stores `is_active` as text and expects `"true"` in both calls.
#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    id: u64,
    name: &'a str,
    full_name: &'a str,
    is_active: &'static str,
    backend_path: &'a str,
}

impl<'a> WebhookRequest<'a> {
    fn new(repo: &'a Repository, backend_path: &'a str) -> Self {
        Self {
            id: repo.id,
            name: &repo.name,
            full_name: &repo.full_name,
            is_active: "true",
            backend_path,
        }
    }
}

/// Fetches details and directory tree of one repository.
#[instrument(skip(gateway))]
pub async fn get_details(gateway: &AuthGateway, id: u64) -> crate::Result<RepositoryDetails> {
    gateway.get_json(&endpoints::repo_details(id)).await
}

/// Controller behind the repository page.
///
/// Holds a local copy of the repository. Monitoring changes are applied to
/// that copy once the backend accepts them; the next listing fetch is the
/// authority.
pub struct DetailController<'a> {
    gateway: &'a AuthGateway,
    notifier: &'a dyn Notifier,
    repository: Repository,
    details: Option<RepositoryDetails>,
    confirm_open: bool,
    docs: DocsCell,
}

impl<'a> DetailController<'a> {
    /// Creates a controller for a repository taken from the listing.
    pub fn new(gateway: &'a AuthGateway, notifier: &'a dyn Notifier, repository: Repository) -> Self {
        Self {
            gateway,
            notifier,
            repository,
            details: None,
            confirm_open: false,
            docs: DocsCell::new(),
        }
    }

    /// Local copy of the repository.
    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Details, once loaded.
    #[must_use]
    pub fn details(&self) -> Option<&RepositoryDetails> {
        self.details.as_ref()
    }

    /// Loads details and tree.
    pub async fn load_details(&mut self) -> crate::Result<&RepositoryDetails> {
        match get_details(self.gateway, self.repository.id).await {
            Ok(details) => Ok(self.details.insert(details)),
            Err(e) => {
                if !e.is_session_error() {
                    self.notifier.error("Failed to fetch repository details");
                }
                Err(e)
            }
        }
    }

    /// Edits the backend path locally. Nothing is sent.
    pub fn set_backend_path(&mut self, path: impl Into<String>) {
        self.repository.backend_path = Some(path.into());
    }

    /// Starts monitoring the repository.
    ///
    /// Requires a non-blank backend path; otherwise no request is made.
    #[instrument(skip(self), fields(repo = %self.repository.full_name))]
    pub async fn activate(&mut self) -> crate::Result<()> {
        if self.repository.is_active {
            return Err(DoccieError::validation("Repository is already monitored"));
        }

        let backend_path = self
            .repository
            .backend_path
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if backend_path.is_empty() {
            self.notifier.error("Please enter a valid backend path");
            return Err(DoccieError::validation("Please enter a valid backend path"));
        }

        let body = WebhookRequest::new(&self.repository, &backend_path);
        let result = self
            .send_webhook(Method::POST, endpoints::CREATE_WEBHOOK, &body)
            .await;
        if let Err(e) = result {
            self.report_failure(&e, "Failed to activate repository");
            return Err(e);
        }

        self.repository.is_active = true;
        self.repository.backend_path = Some(backend_path);
        info!("Repository activated");
        self.notifier.success("Repository is now monitored");
        Ok(())
    }

    /// Opens the deactivation confirmation.
    pub fn request_deactivation(&mut self) -> crate::Result<()> {
        if !self.repository.is_active {
            return Err(DoccieError::validation("Repository is not monitored"));
        }
        self.confirm_open = true;
        Ok(())
    }

    /// Closes the deactivation confirmation without doing anything.
    pub fn cancel_deactivation(&mut self) {
        self.confirm_open = false;
    }

    /// Returns `true` while the deactivation confirmation is open.
    #[must_use]
    pub fn is_confirmation_open(&self) -> bool {
        self.confirm_open
    }

    /// Stops monitoring. Only valid while the confirmation is open.
    ///
    /// On failure the confirmation stays open.
    #[instrument(skip(self), fields(repo = %self.repository.full_name))]
    pub async fn confirm_deactivation(&mut self) -> crate::Result<()> {
        if !self.confirm_open {
            return Err(DoccieError::validation("No deactivation is pending"));
        }

        let backend_path = self.repository.backend_path.clone().unwrap_or_default();
        let body = WebhookRequest::new(&self.repository, &backend_path);
        let result = self
            .send_webhook(Method::DELETE, endpoints::DELETE_WEBHOOK, &body)
            .await;
        if let Err(e) = result {
            self.report_failure(&e, "Failed to deactivate repository");
            return Err(e);
        }

        self.repository.is_active = false;
        self.confirm_open = false;
        info!("Repository deactivated");
        self.notifier.warning("Repository is no longer monitored");
        Ok(())
    }

    async fn send_webhook(
        &self,
        method: Method,
        path: &str,
        body: &WebhookRequest<'_>,
    ) -> crate::Result<()> {
        let response = self
            .gateway
            .send_protected(|api, _| Ok(api.request(method, path)?.json(body)))
            .await?;
        api::expect_success(response).await?;
        Ok(())
    }

    fn report_failure(&self, error: &DoccieError, fallback: &str) {
        match error {
            e if e.is_session_error() => {}
            DoccieError::Fetch { message, .. } if !message.is_empty() => {
                self.notifier.error(message);
            }
            _ => self.notifier.error(fallback),
        }
    }

    /// Opens the documentation view.
    ///
    /// The first call fetches; later calls return the held state.
    pub async fn select_docs(&mut self) -> crate::Result<&DocsState> {
        let gateway = self.gateway;
        let full_name = self.repository.full_name.clone();
        let before = self.docs.fetch_count();

        self.docs
            .get_or_fetch(move || async move { fetch_documentation(gateway, &full_name).await })
            .await?;

        let state = self.docs.state();
        if self.docs.fetch_count() != before {
            debug!(?state, "Documentation fetched");
            match state {
                DocsState::Ready(DocsOutcome::NotFound) => {
                    self.notifier.info("Could not find documentation files");
                }
                DocsState::Ready(DocsOutcome::Bundle(_)) => {
                    self.notifier.success("Documentation fetched successfully");
                }
                DocsState::Failed(message) => self.notifier.error(message),
                DocsState::NotRequested | DocsState::Loading => {}
            }
        }
        Ok(state)
    }

    /// Documentation state without fetching.
    #[must_use]
    pub fn docs(&self) -> &DocsState {
        self.docs.state()
    }
}

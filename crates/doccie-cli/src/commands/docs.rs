// SPDX-License-Identifier: Apache-2.0

//! Documentation commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use doccie_core::docs::DIAGRAM_FILE_NAME;
use doccie_core::{
    AuthGateway, DetailController, DocsOutcome, DocsState, DocumentationBundle, ExportFormat,
    Notifier, RepoSelector,
};
use tracing::debug;

use super::maybe_spinner;
use super::repo::resolve;
use super::types::{DocsResult, ExportResult};
use crate::cli::OutputContext;

/// Fetches the documentation of `selector`.
///
/// Returns the repository's full name with `None` when nothing has been
/// generated yet. Fetch failures have already been shown as notices.
async fn fetch(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
) -> Result<(String, Option<DocumentationBundle>)> {
    let repository = resolve(gateway, notifier, ctx, selector).await?;
    let full_name = repository.full_name.clone();
    let mut controller = DetailController::new(gateway, notifier, repository);

    let spinner = maybe_spinner(ctx, "Fetching documentation...");
    let state = controller.select_docs().await.cloned();
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    match state? {
        DocsState::Ready(DocsOutcome::Bundle(bundle)) => Ok((full_name, Some(bundle))),
        DocsState::Ready(DocsOutcome::NotFound) => Ok((full_name, None)),
        DocsState::Failed(_) => bail!("Could not fetch documentation for {full_name}"),
        DocsState::NotRequested | DocsState::Loading => {
            bail!("Documentation request for {full_name} did not complete")
        }
    }
}

async fn require_bundle(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
) -> Result<(String, DocumentationBundle)> {
    match fetch(gateway, notifier, ctx, selector).await? {
        (full_name, Some(bundle)) => Ok((full_name, bundle)),
        (full_name, None) => {
            bail!("No documentation has been generated for {full_name} yet")
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote file");
    Ok(())
}

/// Run the show command.
pub async fn run_show(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
) -> Result<DocsResult> {
    let (repository, bundle) = fetch(gateway, notifier, ctx, selector).await?;

    Ok(match bundle {
        Some(bundle) => DocsResult {
            repository,
            available: true,
            title: bundle.title().map(str::to_string),
            version: bundle.version().map(str::to_string),
            operations: bundle.operations(),
            has_diagram: bundle.dependency_diagram.is_some(),
        },
        None => DocsResult {
            repository,
            available: false,
            title: None,
            version: None,
            operations: Vec::new(),
            has_diagram: false,
        },
    })
}

/// Run the export command.
pub async fn run_export(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
    format: ExportFormat,
    out: Option<PathBuf>,
) -> Result<ExportResult> {
    let (repository, bundle) = require_bundle(gateway, notifier, ctx, selector).await?;

    let content = bundle.export(format)?;
    let path = out.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
    write_file(&path, &content)?;

    Ok(ExportResult {
        repository,
        path,
        format: match format {
            ExportFormat::Yaml => "yaml",
            ExportFormat::Json => "json",
        },
        bytes: content.len(),
    })
}

/// Run the diagram command.
pub async fn run_diagram(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
    out: Option<PathBuf>,
) -> Result<ExportResult> {
    let (repository, bundle) = require_bundle(gateway, notifier, ctx, selector).await?;

    let Some(diagram) = bundle.dependency_diagram else {
        bail!("No dependency diagram was generated for {repository}");
    };
    let path = out.unwrap_or_else(|| PathBuf::from(DIAGRAM_FILE_NAME));
    write_file(&path, &diagram)?;

    Ok(ExportResult {
        repository,
        path,
        format: "mermaid",
        bytes: diagram.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs").join("api.yaml");

        write_file(&path, "openapi: 3.0.0\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "openapi: 3.0.0\n");
    }

    #[test]
    fn write_file_accepts_bare_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency.mmd");

        write_file(&path, "graph TD\n").unwrap();
        assert!(path.exists());
    }
}

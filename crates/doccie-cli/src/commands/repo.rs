// SPDX-License-Identifier: Apache-2.0

//! Repository listing and monitoring commands.

use anyhow::{Result, anyhow, bail};
use dialoguer::Confirm;
use doccie_core::repos::{FilterView, Listing, RepositoryDirectory};
use doccie_core::{
    AuthGateway, DetailController, Notifier, RepoSelector, RepoStatus, Repository, StatusSet,
};

use super::maybe_spinner;
use super::types::{RepoAction, RepoActionResult, RepoDetailResult, RepoListResult};
use crate::cli::OutputContext;

/// Fetches the listing, failing the command when the backend could not be read.
async fn load_directory<'a>(
    gateway: &'a AuthGateway,
    notifier: &'a dyn Notifier,
    ctx: &OutputContext,
) -> Result<RepositoryDirectory<'a>> {
    let mut directory = RepositoryDirectory::new(gateway, notifier);

    let spinner = maybe_spinner(ctx, "Fetching repositories...");
    let refreshed = directory.refresh().await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    refreshed?;

    if let Listing::Failed(message) = directory.listing() {
        bail!("{message}");
    }
    Ok(directory)
}

/// Looks `selector` up in the user's listing.
pub(super) async fn resolve(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
) -> Result<Repository> {
    let directory = load_directory(gateway, notifier, ctx).await?;
    directory
        .find(selector)
        .cloned()
        .ok_or_else(|| anyhow!("Repository {selector} not found in your repositories"))
}

/// Run the list command.
pub async fn run_list(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    search: Option<String>,
    statuses: Vec<RepoStatus>,
) -> Result<RepoListResult> {
    let mut directory = load_directory(gateway, notifier, ctx).await?;
    directory.set_search(search.clone().unwrap_or_default());
    directory.set_statuses(StatusSet::from_statuses(&statuses));

    let total = match directory.listing() {
        Listing::Loaded(repos) => repos.len(),
        _ => 0,
    };
    let repos = match directory.view() {
        FilterView::Matches(repos) => repos.into_iter().cloned().collect(),
        FilterView::NoResults => Vec::new(),
        FilterView::Failed(message) => bail!("{message}"),
        FilterView::Loading => bail!("Repository listing did not finish loading"),
    };

    Ok(RepoListResult {
        repos,
        total,
        search,
        statuses,
    })
}

/// Run the show command.
pub async fn run_show(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
) -> Result<RepoDetailResult> {
    let repository = resolve(gateway, notifier, ctx, selector).await?;
    let mut controller = DetailController::new(gateway, notifier, repository);

    let spinner = maybe_spinner(ctx, "Fetching repository details...");
    let details = controller.load_details().await.cloned();
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    Ok(RepoDetailResult {
        details: details?,
        repository: controller.repository().clone(),
    })
}

/// Run the activate command.
pub async fn run_activate(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
    backend_path: String,
) -> Result<RepoActionResult> {
    let repository = resolve(gateway, notifier, ctx, selector).await?;
    let mut controller = DetailController::new(gateway, notifier, repository);
    controller.set_backend_path(backend_path);

    let spinner = maybe_spinner(ctx, "Installing webhook...");
    let activated = controller.activate().await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    activated?;

    Ok(RepoActionResult {
        repository: controller.repository().clone(),
        action: RepoAction::Activated,
    })
}

/// Run the deactivate command.
///
/// `confirmed` skips the prompt. Without it, a non-interactive run refuses
/// rather than removing the webhook silently.
pub async fn run_deactivate(
    gateway: &AuthGateway,
    notifier: &dyn Notifier,
    ctx: &OutputContext,
    selector: &RepoSelector,
    confirmed: bool,
) -> Result<RepoActionResult> {
    let repository = resolve(gateway, notifier, ctx, selector).await?;
    let mut controller = DetailController::new(gateway, notifier, repository);
    controller.request_deactivation()?;

    let proceed = if confirmed {
        true
    } else if ctx.is_interactive() {
        Confirm::new()
            .with_prompt(format!(
                "Stop monitoring {}? Documentation will no longer be regenerated.",
                controller.repository().full_name
            ))
            .default(false)
            .interact()?
    } else {
        controller.cancel_deactivation();
        bail!("Refusing to deactivate without confirmation; pass --yes to proceed");
    };

    if !proceed {
        controller.cancel_deactivation();
        return Ok(RepoActionResult {
            repository: controller.repository().clone(),
            action: RepoAction::Cancelled,
        });
    }

    let spinner = maybe_spinner(ctx, "Removing webhook...");
    let deactivated = controller.confirm_deactivation().await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    deactivated?;

    Ok(RepoActionResult {
        repository: controller.repository().clone(),
        action: RepoAction::Deactivated,
    })
}

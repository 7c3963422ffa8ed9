// SPDX-License-Identifier: Apache-2.0

//! Command handlers for Doccie CLI.

pub mod auth;
pub mod completion;
pub mod docs;
pub mod repo;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use doccie_core::{AppConfig, AuthGateway, DoccieError};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{AuthCommand, Commands, CompletionCommand, DocsCommand, OutputContext, RepoCommand};
use crate::notify::ConsoleNotifier;
use crate::output;

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

/// Builds a gateway whose stored session has been validated.
///
/// Protected commands never run on an unvalidated session; a stale or
/// revoked one is cleared here and the command fails with a login hint.
async fn authenticated_gateway(config: &AppConfig, ctx: &OutputContext) -> Result<AuthGateway> {
    let gateway = AuthGateway::from_config(config)?;

    let spinner = maybe_spinner(ctx, "Checking session...");
    let valid = gateway.validate_session().await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    if !valid {
        debug!("No valid session for protected command");
        return Err(DoccieError::NotAuthenticated.into());
    }
    Ok(gateway)
}

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, ctx: OutputContext, config: &AppConfig) -> Result<()> {
    let notifier = ConsoleNotifier::new(&ctx);

    match command {
        Commands::Auth(auth_cmd) => {
            let gateway = AuthGateway::from_config(config)?;
            match auth_cmd {
                AuthCommand::Login { code, no_browser } => {
                    let result = auth::run_login(&gateway, &ctx, code, no_browser).await?;
                    output::render(&result, &ctx)
                }
                AuthCommand::Logout => {
                    let result = auth::run_logout(&gateway)?;
                    output::render(&result, &ctx)
                }
                AuthCommand::Status => {
                    let result = auth::run_status(&gateway);
                    output::render(&result, &ctx)
                }
            }
        }

        Commands::Repo(repo_cmd) => {
            let gateway = authenticated_gateway(config, &ctx).await?;
            match repo_cmd {
                RepoCommand::List { search, status } => {
                    let statuses = status.into_iter().map(Into::into).collect();
                    let result = repo::run_list(&gateway, &notifier, &ctx, search, statuses).await?;
                    output::render(&result, &ctx)
                }
                RepoCommand::Show { repo } => {
                    let result = repo::run_show(&gateway, &notifier, &ctx, &repo).await?;
                    output::render(&result, &ctx)
                }
                RepoCommand::Activate { repo, backend_path } => {
                    let result =
                        repo::run_activate(&gateway, &notifier, &ctx, &repo, backend_path).await?;
                    output::render(&result, &ctx)
                }
                RepoCommand::Deactivate { repo, yes } => {
                    let confirm = yes || !config.ui.confirm_before_deactivate;
                    let result =
                        repo::run_deactivate(&gateway, &notifier, &ctx, &repo, confirm).await?;
                    output::render(&result, &ctx)
                }
            }
        }

        Commands::Docs(docs_cmd) => {
            let gateway = authenticated_gateway(config, &ctx).await?;
            match docs_cmd {
                DocsCommand::Show { repo } => {
                    let result = docs::run_show(&gateway, &notifier, &ctx, &repo).await?;
                    output::render(&result, &ctx)
                }
                DocsCommand::Export { repo, format, out } => {
                    let result =
                        docs::run_export(&gateway, &notifier, &ctx, &repo, format.into(), out)
                            .await?;
                    output::render(&result, &ctx)
                }
                DocsCommand::Diagram { repo, out } => {
                    let result = docs::run_diagram(&gateway, &notifier, &ctx, &repo, out).await?;
                    output::render(&result, &ctx)
                }
            }
        }

        Commands::Completion(CompletionCommand::Generate { shell }) => {
            completion::run_generate(shell)
        }
    }
}

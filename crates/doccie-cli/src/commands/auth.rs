// SPDX-License-Identifier: Apache-2.0

//! GitHub sign-in, sign-out and session status.

use std::time::Duration;

use anyhow::Result;
use console::style;
use doccie_core::AuthGateway;
use tracing::{info, warn};

use super::maybe_spinner;
use super::types::{AuthStatusResult, LoginResult, LogoutResult};
use crate::callback::CallbackServer;
use crate::cli::OutputContext;

/// Run the login command - sign in with GitHub through the backend.
///
/// With `code`, the code is exchanged directly. Otherwise the browser is sent
/// to the provider and the redirect is caught on the loopback listener.
pub async fn run_login(
    gateway: &AuthGateway,
    ctx: &OutputContext,
    code: Option<String>,
    no_browser: bool,
) -> Result<LoginResult> {
    let code = match code {
        Some(code) => code,
        None => {
            if gateway.validate_session().await
                && let Some(session) = gateway.store().load()
            {
                return Ok(LoginResult {
                    user: session.profile.display_name(),
                    login: session.profile.login,
                    already_signed_in: true,
                });
            }
            wait_for_browser(gateway, ctx, no_browser).await?
        }
    };

    let spinner = maybe_spinner(ctx, "Signing in...");
    let session = gateway.complete_oauth_callback(&code).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    let session = session?;

    info!("Signed in");
    Ok(LoginResult {
        user: session.profile.display_name(),
        login: session.profile.login,
        already_signed_in: false,
    })
}

async fn wait_for_browser(
    gateway: &AuthGateway,
    ctx: &OutputContext,
    no_browser: bool,
) -> Result<String> {
    let url = gateway.authorization_url()?;
    let server = CallbackServer::bind(&gateway.oauth().redirect_uri).await?;

    let opened = !no_browser
        && match open::that(url.as_str()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not open a browser");
                false
            }
        };
    if opened {
        eprintln!(
            "{} Continue in your browser to sign in with GitHub.",
            style("*").cyan().bold()
        );
    } else {
        eprintln!(
            "{} Open this URL to sign in with GitHub:\n\n  {}\n",
            style("*").cyan().bold(),
            style(url.as_str()).cyan()
        );
    }

    let timeout = Duration::from_secs(gateway.oauth().callback_timeout_seconds);
    let spinner = maybe_spinner(ctx, "Waiting for the browser...");
    let code = server.wait_for_code(timeout).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    code
}

/// Run the logout command - remove the stored session.
pub fn run_logout(gateway: &AuthGateway) -> Result<LogoutResult> {
    let was_signed_in = gateway.store().load().is_some();
    gateway.logout()?;
    Ok(LogoutResult { was_signed_in })
}

/// Run the status command - show the stored session without contacting the backend.
pub fn run_status(gateway: &AuthGateway) -> AuthStatusResult {
    let storage = gateway.store().location();
    match gateway.store().load() {
        Some(session) => AuthStatusResult {
            authenticated: true,
            user: Some(session.profile.display_name()),
            login: session.profile.login,
            signed_in_at: session.credential.obtained_at,
            storage,
        },
        None => AuthStatusResult {
            authenticated: false,
            user: None,
            login: None,
            signed_in_at: None,
            storage,
        },
    }
}

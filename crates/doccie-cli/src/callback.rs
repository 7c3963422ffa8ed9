// SPDX-License-Identifier: Apache-2.0

//! Loopback listener for the OAuth redirect.
//!
//! The provider sends the browser back to the configured `redirect_uri` with
//! `?code=...`. This server accepts exactly one such request, answers with a
//! page that drops the code from the address bar, and hands the code to the
//! login command.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use axum::Router;
use axum::extract::{OriginalUri, Query, State};
use axum::response::Html;
use axum::routing::get;
use doccie_core::strip_code_param;
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tracing::debug;

/// How long in-flight responses get to finish once the code has arrived.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Query parameters of the redirect.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

struct CallbackState {
    redirect: Url,
    tx: Option<oneshot::Sender<Result<String>>>,
}

/// Listener bound to the host and port of the redirect URI.
pub struct CallbackServer {
    listener: TcpListener,
    redirect: Url,
}

impl CallbackServer {
    /// Binds the address of `redirect_uri`.
    ///
    /// Only `http` loopback addresses are accepted; the CLI cannot receive a
    /// redirect anywhere else.
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let redirect = Url::parse(redirect_uri)
            .with_context(|| format!("Invalid oauth.redirect_uri '{redirect_uri}'"))?;
        let addr = loopback_addr(&redirect)?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to listen on {addr} for the OAuth callback"))?;
        debug!(%addr, path = redirect.path(), "OAuth callback server listening");

        Ok(Self { listener, redirect })
    }

    /// The redirect URI with the port actually bound.
    pub fn redirect_url(&self) -> Result<Url> {
        let port = self.listener.local_addr()?.port();
        let mut url = self.redirect.clone();
        url.set_port(Some(port))
            .map_err(|()| anyhow!("Cannot set port on {url}"))?;
        Ok(url)
    }

    /// Waits for the browser to return and yields the authorization code.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String> {
        let redirect = self.redirect_url()?;
        let (tx, rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let state = Arc::new(Mutex::new(CallbackState {
            redirect: redirect.clone(),
            tx: Some(tx),
        }));
        let app = Router::new()
            .route(redirect.path(), get(handle_callback))
            .with_state(state);

        let listener = self.listener;
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        let outcome = tokio::time::timeout(timeout, rx).await;

        let _ = stop_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
            debug!("Callback server did not stop in time");
        }

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => bail!("Callback channel closed unexpectedly"),
            Err(_) => bail!(
                "Timed out after {}s waiting for the browser to return",
                timeout.as_secs()
            ),
        }
    }
}

fn loopback_addr(redirect: &Url) -> Result<SocketAddr> {
    if redirect.scheme() != "http" {
        bail!("oauth.redirect_uri must use http:// to be received by the CLI");
    }
    let port = redirect.port_or_known_default().unwrap_or(80);
    let ip = match redirect.host_str() {
        Some("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .with_context(|| format!("oauth.redirect_uri host '{host}' is not a loopback address"))?,
        None => bail!("oauth.redirect_uri has no host"),
    };
    if !ip.is_loopback() {
        bail!("oauth.redirect_uri host '{ip}' is not a loopback address");
    }
    Ok(SocketAddr::new(ip, port))
}

async fn handle_callback(
    State(state): State<Arc<Mutex<CallbackState>>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let mut state = state.lock().await;

    let result = process_callback(params);
    let page = match &result {
        Ok(_) => {
            let clean = state
                .redirect
                .join(&uri.to_string())
                .map(|full| strip_code_param(&full))
                .unwrap_or_else(|_| state.redirect.clone());
            success_page(&clean)
        }
        Err(e) => error_page(&e.to_string()),
    };

    match state.tx.take() {
        Some(tx) => {
            let _ = tx.send(result);
            Html(page)
        }
        None => Html(error_page("This sign-in has already been handled.")),
    }
}

fn process_callback(params: CallbackParams) -> Result<String> {
    if let Some(error) = params.error {
        if error == "access_denied" {
            bail!("Authorization was denied in the browser");
        }
        bail!(
            "Authorization failed: {}",
            params.error_description.unwrap_or(error)
        );
    }

    params
        .code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| anyhow!("Missing authorization code in callback"))
}

fn success_page(clean: &Url) -> String {
    let mut location = clean.path().to_string();
    if let Some(query) = clean.query() {
        location.push('?');
        location.push_str(query);
    }
    let location = serde_json::to_string(&location).unwrap_or_else(|_| "\"/\"".to_string());
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Doccie</title></head>\n\
         <body><h1>Signed in</h1><p>You can close this tab and return to the terminal.</p>\n\
         <script>history.replaceState(null, \"\", {location});</script></body></html>\n"
    )
}

fn error_page(message: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Doccie</title></head>\n\
         <body><h1>Sign-in failed</h1><p>{}</p><p>Return to the terminal and try again.</p></body></html>\n",
        escape_html(message)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

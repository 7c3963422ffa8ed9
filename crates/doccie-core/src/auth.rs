// SPDX-License-Identifier: Apache-2.0

//! Authentication gateway.
//!
//! Implements the browser OAuth flow used by Doccie:
//! 1. Build the provider authorization URL and send the user there
//! 2. Receive the `code` on the redirect URI
//! 3. Exchange the code for a credential at the backend
//! 4. Fetch the user profile with that credential
//! 5. Persist credential and profile together
//!
//! The gateway is also the only path for protected requests: it reads the
//! credential from the [`SessionStore`] on every call and clears the session
//! when the backend answers 401.

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::api::{self, ApiClient, endpoints};
use crate::config::{AppConfig, OAuthConfig};
use crate::error::DoccieError;
use crate::session::{AuthState, Credential, Session, SessionStore, UserProfile, open_store};

/// Query parameter carrying the OAuth authorization code.
pub const CODE_PARAM: &str = "code";

/// OAuth flow, session validation and protected request dispatch.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    api: ApiClient,
    store: Arc<SessionStore>,
    oauth: OAuthConfig,
}

impl AuthGateway {
    /// Creates a gateway over an existing client and store.
    pub fn new(api: ApiClient, store: Arc<SessionStore>, oauth: OAuthConfig) -> Self {
        Self { api, store, oauth }
    }

    /// Creates a gateway from configuration, opening the configured session backend.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let api = ApiClient::new(&config.api)?;
        let store = open_store(config.session.backend)?;
        Ok(Self::new(api, Arc::new(store), config.oauth.clone()))
    }

    /// Backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Session store shared with every consumer.
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// OAuth settings.
    #[must_use]
    pub fn oauth(&self) -> &OAuthConfig {
        &self.oauth
    }

    /// Current authentication state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.store.state()
    }

    /// Builds the provider authorization URL.
    ///
    /// Always asks for consent and leaves `login` empty so the provider lets
    /// the user pick an account.
    pub fn authorization_url(&self) -> crate::Result<Url> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(DoccieError::Config {
                message: "oauth.client_id is not set".to_string(),
            });
        }

        let mut url = Url::parse(&self.oauth.authorize_url).map_err(|e| DoccieError::Config {
            message: format!(
                "Invalid oauth.authorize_url '{}': {e}",
                self.oauth.authorize_url
            ),
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", self.oauth.client_id.trim())
            .append_pair("redirect_uri", &self.oauth.redirect_uri)
            .append_pair("scope", &self.oauth.scopes)
            .append_pair("prompt", "consent")
            .append_pair("login", "");
        Ok(url)
    }

    /// Exchanges an authorization code for a session.
    ///
    /// The credential and the profile must both be obtained before anything
    /// is persisted. Any failure clears the store, so a failed callback never
    /// leaves a partial session behind.
    #[instrument(skip_all)]
    pub async fn complete_oauth_callback(&self, code: &str) -> crate::Result<Session> {
        let code = code.trim();
        if code.is_empty() {
            return Err(DoccieError::validation("Authorization code is empty"));
        }

        match self.exchange_and_fetch(code).await {
            Ok(session) => {
                if let Err(e) = self.store.save(&session.credential, &session.profile) {
                    self.discard_session();
                    return Err(e);
                }
                info!(user = %session.profile.display_name(), "Signed in");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "OAuth callback failed");
                self.discard_session();
                Err(match e {
                    DoccieError::Auth { .. } => e,
                    other => DoccieError::Auth {
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    async fn exchange_and_fetch(&self, code: &str) -> crate::Result<Session> {
        debug!("Exchanging authorization code");
        let response = self
            .api
            .request(Method::GET, endpoints::ACCESS_TOKEN)?
            .query(&[(CODE_PARAM, code)])
            .send()
            .await?;
        let mut credential: Credential = api::read_json(response).await?;
        if !credential.is_usable() {
            return Err(DoccieError::Auth {
                message: "Backend returned an empty access token".to_string(),
            });
        }
        credential.obtained_at = Some(Utc::now());

        let profile = self.fetch_profile(&credential).await?;
        Ok(Session {
            credential,
            profile,
        })
    }

    async fn fetch_profile(&self, credential: &Credential) -> crate::Result<UserProfile> {
        let response = self
            .api
            .request(Method::GET, endpoints::USER_DATA)?
            .header(AUTHORIZATION, credential.authorization())
            .send()
            .await?;
        api::read_json(response).await
    }

    /// Confirms that the stored session is still accepted by the backend.
    ///
    /// Returns `true` without a network call when the state is already
    /// authenticated. Otherwise the stored credential is used to fetch the
    /// profile; any failure clears the session and returns `false`.
    #[instrument(skip(self))]
    pub async fn validate_session(&self) -> bool {
        if self.state() == AuthState::Authenticated {
            debug!("Session already validated");
            return true;
        }

        let Some(session) = self.store.load() else {
            debug!("No stored session");
            self.discard_session();
            return false;
        };

        match self.fetch_profile(&session.credential).await {
            Ok(profile) => match self.store.save(&session.credential, &profile) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Failed to refresh stored profile");
                    self.discard_session();
                    false
                }
            },
            Err(e) => {
                info!(error = %e, "Stored session rejected");
                self.discard_session();
                false
            }
        }
    }

    /// Ends the session. Idempotent.
    #[instrument(skip(self))]
    pub fn logout(&self) -> crate::Result<()> {
        self.store.clear()?;
        info!("Signed out");
        Ok(())
    }

    /// Returns the stored credential while the session is authenticated.
    pub fn require_session(&self) -> crate::Result<Credential> {
        if self.state() != AuthState::Authenticated {
            return Err(DoccieError::NotAuthenticated);
        }
        if let Some(credential) = self.store.credential() {
            return Ok(credential);
        }
        // Records vanished underneath us (another process logged out)
        self.discard_session();
        Err(DoccieError::NotAuthenticated)
    }

    /// Sends a protected request.
    ///
    /// `build` receives the client and the current credential; the bearer
    /// header is attached here. A 401 clears the session and returns
    /// [`DoccieError::Unauthorized`]. Every other response is returned as is
    /// for the caller to interpret.
    pub async fn send_protected<F>(&self, build: F) -> crate::Result<Response>
    where
        F: FnOnce(&ApiClient, &Credential) -> crate::Result<RequestBuilder>,
    {
        let credential = self.require_session()?;
        let response = build(&self.api, &credential)?
            .header(AUTHORIZATION, credential.authorization())
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url().path(), "Backend rejected the credential");
            self.discard_session();
            return Err(DoccieError::Unauthorized);
        }
        Ok(response)
    }

    /// Protected `GET` decoding a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let response = self
            .send_protected(|api, _| api.request(Method::GET, path))
            .await?;
        api::read_json(response).await
    }

    fn discard_session(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session");
        }
    }
}

/// Returns `url` without the OAuth `code` parameter.
///
/// Other query parameters are kept in order. The query is removed entirely
/// when nothing is left.
#[must_use]
pub fn strip_code_param(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CODE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut clean = url.clone();
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(&kept);
    }
    clean
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn gateway() -> AuthGateway {
        // Nothing listens on the discard port; tests here must not hit the network
        let api = ApiClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(1))
            .expect("valid client");
        let oauth = OAuthConfig {
            client_id: "Iv1.test".to_string(),
            ..OAuthConfig::default()
        };
        AuthGateway::new(api, Arc::new(SessionStore::in_memory()), oauth)
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: 7,
            name: Some("Ada".to_string()),
            login: Some("ada".to_string()),
            avatar_url: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn authorization_url_carries_oauth_params() {
        let url = gateway().authorization_url().unwrap();
        assert_eq!(url.host_str(), Some("github.com"));

        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("client_id".to_string(), "Iv1.test".to_string()),
                (
                    "redirect_uri".to_string(),
                    "http://127.0.0.1:5173/".to_string()
                ),
                (
                    "scope".to_string(),
                    "repo admin:repo_hook read:user".to_string()
                ),
                ("prompt".to_string(), "consent".to_string()),
                ("login".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn authorization_url_requires_client_id() {
        let mut gw = gateway();
        gw.oauth.client_id = "  ".to_string();
        assert!(matches!(
            gw.authorization_url(),
            Err(DoccieError::Config { .. })
        ));
    }

    #[test]
    fn strip_code_param_keeps_other_params() {
        let url = Url::parse("http://127.0.0.1:5173/?code=abc123&tab=docs").unwrap();
        assert_eq!(
            strip_code_param(&url).as_str(),
            "http://127.0.0.1:5173/?tab=docs"
        );

        let url = Url::parse("http://127.0.0.1:5173/callback?code=abc123").unwrap();
        assert_eq!(
            strip_code_param(&url).as_str(),
            "http://127.0.0.1:5173/callback"
        );
    }

    #[test]
    fn require_session_rejects_unvalidated_state() {
        let gw = gateway();
        // Records exist but nobody validated them yet
        gw.store()
            .save(&Credential::bearer("tok1"), &profile())
            .unwrap();
        gw.store().set_state(AuthState::Unknown);

        assert!(matches!(
            gw.require_session(),
            Err(DoccieError::NotAuthenticated)
        ));
    }

    #[test]
    fn require_session_returns_stored_credential() {
        let gw = gateway();
        gw.store()
            .save(&Credential::bearer("tok1"), &profile())
            .unwrap();
        let credential = gw.require_session().unwrap();
        assert_eq!(credential.authorization(), "Bearer tok1");
    }

    #[test]
    fn logout_is_idempotent() {
        let gw = gateway();
        gw.store()
            .save(&Credential::bearer("tok1"), &profile())
            .unwrap();

        gw.logout().unwrap();
        gw.logout().unwrap();
        assert_eq!(gw.state(), AuthState::Anonymous);
        assert!(gw.store().load().is_none());
    }

    #[tokio::test]
    async fn validate_session_skips_network_when_authenticated() {
        let gw = gateway();
        gw.store()
            .save(&Credential::bearer("tok1"), &profile())
            .unwrap();
        assert!(gw.validate_session().await);
    }

    #[tokio::test]
    async fn validate_session_without_records_is_anonymous() {
        let gw = gateway();
        assert!(!gw.validate_session().await);
        assert_eq!(gw.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn empty_code_is_rejected_locally() {
        let gw = gateway();
        let err = gw.complete_oauth_callback("   ").await.unwrap_err();
        assert!(matches!(err, DoccieError::Validation { .. }));
        assert_eq!(gw.state(), AuthState::Unknown);
    }

    #[tokio::test]
    async fn protected_request_without_session_is_not_sent() {
        let gw = gateway();
        let err = gw
            .get_json::<serde_json::Value>(endpoints::REPO_LIST)
            .await
            .unwrap_err();
        assert!(matches!(err, DoccieError::NotAuthenticated));
    }
}

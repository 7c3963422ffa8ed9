// SPDX-License-Identifier: Apache-2.0

//! Persisted session: credential plus user profile.
//!
//! The [`SessionStore`] is the single authority over the two session records.
//! It guarantees that after any of its operations completes, the credential
//! and the profile are either both present or both absent. It also owns the
//! in-memory [`AuthState`] and publishes every change on a `watch` channel so
//! that all consumers observe the same state.

mod backend;

#[cfg(feature = "keyring")]
pub use backend::{KEYRING_SERVICE, KeyringBackend};
pub use backend::{FileBackend, MemoryBackend, SessionBackend};

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::{SessionBackendKind, data_dir};
use crate::error::DoccieError;

/// Record holding the serialized [`Credential`].
pub const TOKEN_RECORD: &str = "tokenInfo";

/// Record holding the serialized [`UserProfile`].
pub const USER_RECORD: &str = "userInfo";

mod secret_string {
    use super::{Deserialize, Deserializer, ExposeSecret, SecretString, Serializer};

    pub fn serialize<S: Serializer>(value: &SecretString, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(value.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<SecretString, D::Error> {
        String::deserialize(de).map(SecretString::from)
    }
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Access token issued by the backend after the OAuth code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token for protected endpoints.
    #[serde(with = "secret_string")]
    pub access_token: SecretString,
    /// Token type reported by the backend.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When this client received the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<DateTime<Utc>>,
    /// Any other fields returned by the token endpoint.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Credential {
    /// Creates a bearer credential from a raw token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(token.into()),
            token_type: default_token_type(),
            obtained_at: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }

    pub(crate) fn is_usable(&self) -> bool {
        !self.access_token.expose_secret().trim().is_empty()
    }
}

/// Profile of the signed-in user, as relayed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider user id.
    pub id: u64,
    /// Display name (may be unset on the provider).
    #[serde(default)]
    pub name: Option<String>,
    /// Provider login handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Any other profile fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Name to show the user: display name, then login, then the numeric id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.login.as_deref())
            .map_or_else(|| format!("user #{}", self.id), str::to_string)
    }
}

/// Credential and profile, always handled together.
#[derive(Debug, Clone)]
pub struct Session {
    /// Access token.
    pub credential: Credential,
    /// Signed-in user.
    pub profile: UserProfile,
}

/// Authentication state for the lifetime of the process.
///
/// `Unknown` is only ever the initial state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Startup: the stored session has not been validated yet.
    #[default]
    Unknown,
    /// A validated session is stored.
    Authenticated,
    /// No usable session.
    Anonymous,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unknown => write!(f, "unknown"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Owner of the persisted session records and the in-memory auth state.
pub struct SessionStore {
    backend: Mutex<Box<dyn SessionBackend>>,
    state: watch::Sender<AuthState>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("location", &self.location())
            .field("state", &self.state())
            .finish()
    }
}

impl SessionStore {
    /// Creates a store over `backend`. The state starts as [`AuthState::Unknown`].
    pub fn new(backend: impl SessionBackend + 'static) -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        Self {
            backend: Mutex::new(Box::new(backend)),
            state,
        }
    }

    /// Creates a store that keeps the session in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn SessionBackend>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Where the records live.
    pub fn location(&self) -> String {
        self.lock().location()
    }

    /// Current authentication state.
    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Subscribes to authentication state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, state: AuthState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Auth state changed");
        }
    }

    /// Reads the persisted session.
    ///
    /// Returns `None` if either record is missing or does not parse. A
    /// half-present or malformed pair is purged so that it cannot linger.
    #[instrument(skip(self))]
    pub fn load(&self) -> Option<Session> {
        let mut backend = self.lock();

        let token_raw = read_record(&**backend, TOKEN_RECORD);
        let user_raw = read_record(&**backend, USER_RECORD);

        let credential = token_raw
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Credential>(raw).ok())
            .filter(Credential::is_usable);
        let profile = user_raw
            .as_deref()
            .and_then(|raw| serde_json::from_str::<UserProfile>(raw).ok());

        match (credential, profile) {
            (Some(credential), Some(profile)) => Some(Session {
                credential,
                profile,
            }),
            _ => {
                if token_raw.is_some() || user_raw.is_some() {
                    warn!("Stored session is incomplete or malformed, discarding it");
                    remove_both(&mut **backend);
                }
                None
            }
        }
    }

    /// Returns the stored credential if the full session is present.
    pub fn credential(&self) -> Option<Credential> {
        self.load().map(|session| session.credential)
    }

    /// Persists credential and profile together.
    ///
    /// The profile is written first and the credential last; if the credential
    /// write fails the profile is removed again, so readers never see one
    /// without the other.
    #[instrument(skip_all, fields(user_id = profile.id))]
    pub fn save(&self, credential: &Credential, profile: &UserProfile) -> crate::Result<()> {
        let token_json = serde_json::to_string(credential).map_err(|e| DoccieError::Storage {
            message: format!("Failed to serialize credential: {e}"),
        })?;
        let user_json = serde_json::to_string(profile).map_err(|e| DoccieError::Storage {
            message: format!("Failed to serialize user profile: {e}"),
        })?;

        {
            let mut backend = self.lock();
            backend.set(USER_RECORD, &user_json)?;
            if let Err(e) = backend.set(TOKEN_RECORD, &token_json) {
                if let Err(rollback) = backend.remove(USER_RECORD) {
                    warn!(error = %rollback, "Failed to roll back user record");
                }
                return Err(e);
            }
        }

        info!("Session saved");
        self.set_state(AuthState::Authenticated);
        Ok(())
    }

    /// Removes both records and marks the state anonymous. Idempotent.
    ///
    /// Both removals are attempted even if the first one fails; the first
    /// error is returned.
    #[instrument(skip(self))]
    pub fn clear(&self) -> crate::Result<()> {
        let result = {
            let mut backend = self.lock();
            let token = backend.remove(TOKEN_RECORD);
            let user = backend.remove(USER_RECORD);
            token.and(user)
        };
        self.set_state(AuthState::Anonymous);
        debug!("Session cleared");
        result
    }
}

fn read_record(backend: &dyn SessionBackend, key: &str) -> Option<String> {
    match backend.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Failed to read session record");
            None
        }
    }
}

fn remove_both(backend: &mut dyn SessionBackend) {
    for key in [TOKEN_RECORD, USER_RECORD] {
        if let Err(e) = backend.remove(key) {
            warn!(key, error = %e, "Failed to remove session record");
        }
    }
}

/// Opens the session store selected in configuration.
///
/// The file backend lives in `<data_dir>/session`.
pub fn open_store(kind: SessionBackendKind) -> crate::Result<SessionStore> {
    match kind {
        SessionBackendKind::File => Ok(SessionStore::new(FileBackend::new(
            data_dir().join("session"),
        ))),
        #[cfg(feature = "keyring")]
        SessionBackendKind::Keyring => Ok(SessionStore::new(KeyringBackend)),
        #[cfg(not(feature = "keyring"))]
        SessionBackendKind::Keyring => Err(DoccieError::Config {
            message: "session.backend = \"keyring\" requires a build with the `keyring` feature"
                .to_string(),
        }),
    }
}

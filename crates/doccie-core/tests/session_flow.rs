// SPDX-License-Identifier: Apache-2.0

//! Sign-in, validation and protected request tests against a mock backend.

mod common;

use std::sync::Arc;

use axum::http::Method;
use common::{MockBackend, ada, ada_json};
use doccie_core::api::endpoints;
use doccie_core::session::{FileBackend, TOKEN_RECORD, USER_RECORD};
use doccie_core::{AuthState, Credential, DoccieError, SessionStore, strip_code_param};
use reqwest::Url;
use secrecy::ExposeSecret;
use serde_json::json;

fn token_body() -> serde_json::Value {
    json!({"access_token": "tok1", "token_type": "bearer"})
}

#[tokio::test]
async fn callback_exchanges_code_and_persists_session() {
    let backend = MockBackend::start().await;
    backend.on(Method::GET, endpoints::ACCESS_TOKEN, 200, token_body());
    backend.on(Method::GET, endpoints::USER_DATA, 200, ada_json());

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SessionStore::new(FileBackend::new(dir.path())));
    let gateway = backend.gateway_with_store(Arc::clone(&store));

    let session = gateway.complete_oauth_callback("abc123").await.unwrap();

    assert_eq!(session.profile.name.as_deref(), Some("Ada"));
    assert_eq!(session.credential.access_token.expose_secret(), "tok1");
    assert!(session.credential.obtained_at.is_some());
    assert_eq!(gateway.state(), AuthState::Authenticated);

    let exchange = backend.requests_to(endpoints::ACCESS_TOKEN);
    assert_eq!(exchange.len(), 1);
    assert_eq!(exchange[0].query.as_deref(), Some("code=abc123"));
    assert!(exchange[0].authorization.is_none());

    let profile = backend.requests_to(endpoints::USER_DATA);
    assert_eq!(profile[0].authorization.as_deref(), Some("Bearer tok1"));

    assert!(dir.path().join(format!("{TOKEN_RECORD}.json")).exists());
    assert!(dir.path().join(format!("{USER_RECORD}.json")).exists());
    let loaded = store.load().expect("session persisted");
    assert_eq!(loaded.profile, ada());

    let callback = Url::parse("http://127.0.0.1:5173/?code=abc123").unwrap();
    assert_eq!(strip_code_param(&callback).as_str(), "http://127.0.0.1:5173/");
}

#[tokio::test]
async fn callback_with_failing_profile_leaves_no_credential() {
    let backend = MockBackend::start().await;
    backend.on(Method::GET, endpoints::ACCESS_TOKEN, 200, token_body());
    backend.on(
        Method::GET,
        endpoints::USER_DATA,
        500,
        json!({"detail": "GitHub unavailable"}),
    );

    let gateway = backend.gateway();
    let err = gateway.complete_oauth_callback("abc123").await.unwrap_err();

    assert!(matches!(err, DoccieError::Auth { .. }));
    assert!(err.to_string().contains("GitHub unavailable"));
    assert!(gateway.store().load().is_none());
    assert_eq!(gateway.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn failed_callback_clears_previous_session() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        endpoints::ACCESS_TOKEN,
        400,
        json!({"detail": "bad_verification_code"}),
    );

    let gateway = backend.signed_in_gateway();
    assert!(gateway.complete_oauth_callback("stale").await.is_err());

    assert!(gateway.store().load().is_none());
    assert!(backend.requests_to(endpoints::USER_DATA).is_empty());
}

#[tokio::test]
async fn malformed_token_body_is_auth_error() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        endpoints::ACCESS_TOKEN,
        200,
        json!({"Message": "no token"}),
    );

    let gateway = backend.gateway();
    let err = gateway.complete_oauth_callback("abc123").await.unwrap_err();
    assert!(matches!(err, DoccieError::Auth { .. }));
    assert_eq!(gateway.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn validate_session_checks_backend_once() {
    let backend = MockBackend::start().await;
    backend.on(Method::GET, endpoints::USER_DATA, 200, ada_json());

    // Stored by an earlier run; this process has not validated it yet
    let dir = tempfile::tempdir().unwrap();
    SessionStore::new(FileBackend::new(dir.path()))
        .save(&Credential::bearer("tok1"), &ada())
        .unwrap();
    let store = Arc::new(SessionStore::new(FileBackend::new(dir.path())));
    let gateway = backend.gateway_with_store(store);
    assert_eq!(gateway.state(), AuthState::Unknown);

    assert!(gateway.validate_session().await);
    assert!(gateway.validate_session().await);

    assert_eq!(backend.requests_to(endpoints::USER_DATA).len(), 1);
    assert_eq!(gateway.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn rejected_session_is_cleared() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        endpoints::USER_DATA,
        401,
        json!({"detail": "Invalid token"}),
    );

    let dir = tempfile::tempdir().unwrap();
    SessionStore::new(FileBackend::new(dir.path()))
        .save(&Credential::bearer("revoked"), &ada())
        .unwrap();
    let store = Arc::new(SessionStore::new(FileBackend::new(dir.path())));
    let rx = store.subscribe();
    let gateway = backend.gateway_with_store(Arc::clone(&store));

    assert!(!gateway.validate_session().await);

    assert!(store.load().is_none());
    assert!(!dir.path().join(format!("{TOKEN_RECORD}.json")).exists());
    assert!(!dir.path().join(format!("{USER_RECORD}.json")).exists());
    assert_eq!(*rx.borrow(), AuthState::Anonymous);
}

#[tokio::test]
async fn protected_401_clears_session() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        endpoints::REPO_LIST,
        401,
        json!({"detail": "Could not validate credentials"}),
    );

    let gateway = backend.signed_in_gateway();
    let err = gateway
        .get_json::<serde_json::Value>(endpoints::REPO_LIST)
        .await
        .unwrap_err();

    assert!(matches!(err, DoccieError::Unauthorized));
    assert!(gateway.store().load().is_none());
    assert_eq!(gateway.state(), AuthState::Anonymous);

    // Nothing else is sent once the session is gone
    let err = gateway
        .get_json::<serde_json::Value>(endpoints::REPO_LIST)
        .await
        .unwrap_err();
    assert!(matches!(err, DoccieError::NotAuthenticated));
    assert_eq!(backend.requests_to(endpoints::REPO_LIST).len(), 1);
}

#[tokio::test]
async fn non_auth_failures_keep_session() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        endpoints::REPO_LIST,
        400,
        json!({"detail": "Failed to fetch repositories"}),
    );

    let gateway = backend.signed_in_gateway();
    let err = gateway
        .get_json::<serde_json::Value>(endpoints::REPO_LIST)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DoccieError::Fetch {
            status: Some(400),
            ..
        }
    ));
    assert_eq!(err.to_string(), "Failed to fetch repositories");
    assert!(gateway.store().load().is_some());
    assert_eq!(gateway.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn logout_then_validate_is_anonymous() {
    let backend = MockBackend::start().await;
    backend.on(Method::GET, endpoints::USER_DATA, 200, ada_json());

    let gateway = backend.signed_in_gateway();
    gateway.logout().unwrap();

    assert!(!gateway.validate_session().await);
    assert!(gateway.store().load().is_none());
    assert!(backend.requests().is_empty());
}

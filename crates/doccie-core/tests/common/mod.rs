// SPDX-License-Identifier: Apache-2.0

//! In-process mock of the Doccie backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use doccie_core::api::ApiClient;
use doccie_core::{AuthGateway, Credential, OAuthConfig, SessionStore, UserProfile};
use serde_json::{Value, json};

/// A request as seen by the mock.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Inner {
    routes: HashMap<(Method, String), (StatusCode, Value)>,
    requests: Vec<Recorded>,
}

/// Mock backend listening on an ephemeral loopback port.
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
    base_url: String,
}

#[allow(dead_code)]
impl MockBackend {
    /// Starts the server. It lives until the test runtime shuts down.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");

        let backend = Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            base_url: format!("http://{addr}"),
        };

        let app = Router::new().fallback(handle).with_state(backend.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        backend
    }

    /// Base URL to point the client at.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answers `method path` with `status` and a JSON body.
    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).expect("valid status");
        self.inner
            .lock()
            .unwrap()
            .routes
            .insert((method, path.to_string()), (status, body));
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Requests received for one path.
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// A gateway against this backend with an empty in-memory store.
    pub fn gateway(&self) -> AuthGateway {
        self.gateway_with_store(Arc::new(SessionStore::in_memory()))
    }

    /// A gateway against this backend over `store`.
    pub fn gateway_with_store(&self, store: Arc<SessionStore>) -> AuthGateway {
        let api = ApiClient::with_base_url(&self.base_url, Duration::from_secs(5))
            .expect("valid client");
        let oauth = OAuthConfig {
            client_id: "Iv1.test".to_string(),
            ..OAuthConfig::default()
        };
        AuthGateway::new(api, store, oauth)
    }

    /// A gateway already signed in as Ada with token `tok1`.
    pub fn signed_in_gateway(&self) -> AuthGateway {
        let gateway = self.gateway();
        gateway
            .store()
            .save(&Credential::bearer("tok1"), &ada())
            .expect("save session");
        gateway
    }
}

async fn handle(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let recorded = Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    };

    let mut inner = backend.inner.lock().unwrap();
    inner.requests.push(recorded);
    match inner.routes.get(&(method, path)) {
        Some((status, body)) => (*status, axum::Json(body.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, axum::Json(json!({"detail": "Not Found"}))).into_response(),
    }
}

/// Profile returned by the mock for the signed-in user.
pub fn ada() -> UserProfile {
    serde_json::from_value(ada_json()).expect("valid profile")
}

/// Raw `user-data` body.
pub fn ada_json() -> Value {
    json!({
        "id": 1,
        "login": "ada",
        "name": "Ada",
        "avatar_url": "https://avatars.example/u/1"
    })
}

/// Listing used across tests.
#[allow(dead_code)]
pub fn repo_list() -> Value {
    json!([
        {"id": 1, "name": "alpha", "full_name": "octo/alpha", "is_active": true, "backend_path": "api"},
        {"id": 2, "name": "beta", "full_name": "octo/beta", "is_active": false, "backend_path": null}
    ])
}

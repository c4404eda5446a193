//! Remote Data Client: the single configured handle to the hosted backend.
//!
//! Every other component talks to the backend through this handle. It wraps
//! three HTTP surfaces: auth endpoints, relational table endpoints, and
//! object storage. The handle is shared read-only process-wide; each call
//! issues an independent request.

mod auth;
mod query;
mod storage;

pub use query::TableQuery;

use std::sync::RwLock;

use tokio::sync::watch;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AuthSession, Identity};

/// Configured handle to the hosted backend.
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    storage_bucket: String,
    /// Current session, if signed in. Never held across an await.
    session: RwLock<Option<AuthSession>>,
    /// Auth-state change notifications: `Some` on sign-in, `None` on sign-out.
    auth_tx: watch::Sender<Option<Identity>>,
}

impl RemoteClient {
    pub fn new(config: &Config) -> Self {
        let (auth_tx, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            storage_bucket: config.storage_bucket.clone(),
            session: RwLock::new(None),
            auth_tx,
        }
    }

    /// Subscribe to auth-state changes.
    pub fn subscribe_auth(&self) -> watch::Receiver<Option<Identity>> {
        self.auth_tx.subscribe()
    }

    /// Start a query against a named collection.
    pub fn table(&self, name: &str) -> TableQuery<'_> {
        TableQuery::new(self, name)
    }

    /// Identity from the locally held session, without a network call.
    pub fn session_identity(&self) -> Option<Identity> {
        self.session
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub(crate) fn store_session(&self, session: AuthSession) {
        let identity = session.user.clone();
        *self.session.write().expect("session lock poisoned") = Some(session);
        self.auth_tx.send_replace(Some(identity));
    }

    pub(crate) fn clear_session(&self) {
        *self.session.write().expect("session lock poisoned") = None;
        self.auth_tx.send_replace(None);
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub(crate) fn storage_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.storage_bucket, path
        )
    }

    /// Public URL for a stored object.
    pub fn public_object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.storage_bucket, path
        )
    }

    /// Attach the api key and bearer token to a request.
    pub(crate) fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    /// Turn a non-success response into a `Remote` error with the backend's
    /// message, if it sent one.
    pub(crate) async fn reject(resp: reqwest::Response) -> AppError {
        let status = resp.status().as_u16();
        let message = match resp.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("message")
                .or_else(|| body.get("msg"))
                .or_else(|| body.get("error_description"))
                .and_then(|v| v.as_str())
                .unwrap_or("Request rejected")
                .to_string(),
            Err(_) => "Request rejected".to_string(),
        };
        tracing::error!(status, %message, "backend rejected request");
        AppError::Remote { status, message }
    }
}

//! Session resolution: current identity plus the derived display profile.
//!
//! Every authenticated view depends on this. Resolution is
//! identity-then-profile; a missing identity short-circuits without a
//! profile fetch, and fetch failures resolve to empty defaults with no
//! retry.

use std::sync::{Arc, RwLock};

use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::{Identity, ProfileView};

/// Resolved session state as exposed to views.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    /// Display name; empty until a profile row exists.
    pub green_name: String,
    pub email_verified: bool,
}

impl SessionSnapshot {
    pub fn signed_in(&self) -> bool {
        self.identity.is_some()
    }
}

/// Resolves and caches the current session, re-resolving on auth-state
/// changes published by the client.
pub struct SessionResolver {
    client: Arc<RemoteClient>,
    state: RwLock<SessionSnapshot>,
}

impl SessionResolver {
    pub fn new(client: Arc<RemoteClient>) -> Self {
        Self {
            client,
            state: RwLock::new(SessionSnapshot::default()),
        }
    }

    /// Last resolved state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.read().expect("session state poisoned").clone()
    }

    /// Resolve the current identity and display profile.
    pub async fn resolve(&self) -> SessionSnapshot {
        let snapshot = match self.resolve_inner().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::error!("session resolution failed: {}", err);
                SessionSnapshot::default()
            }
        };
        *self.state.write().expect("session state poisoned") = snapshot.clone();
        snapshot
    }

    async fn resolve_inner(&self) -> Result<SessionSnapshot, AppError> {
        let Some(identity) = self.client.current_identity().await? else {
            return Ok(SessionSnapshot::default());
        };

        let email_verified = identity.email_verified();

        // Profile provisioning can lag identity creation; a missing row or
        // a failed fetch both leave the name empty.
        let green_name = match self
            .client
            .table("profiles")
            .select("green_name")
            .eq("user_id", identity.id)
            .fetch_optional::<ProfileView>()
            .await
        {
            Ok(profile) => profile.and_then(|p| p.green_name).unwrap_or_default(),
            Err(err) => {
                tracing::error!("profile fetch failed: {}", err);
                String::new()
            }
        };

        Ok(SessionSnapshot {
            identity: Some(identity),
            green_name,
            email_verified,
        })
    }

    /// Follow auth-state changes: re-resolve when an identity appears,
    /// clear the cached name when it disappears.
    pub fn spawn_watcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let resolver = Arc::clone(self);
        let mut rx = resolver.client.subscribe_auth();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let signed_in = rx.borrow_and_update().is_some();
                if signed_in {
                    resolver.resolve().await;
                } else {
                    *resolver.state.write().expect("session state poisoned") =
                        SessionSnapshot::default();
                }
            }
        })
    }
}

//! Authenticated identity as returned by the backend's auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Set by the backend once the verification link is followed.
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn email_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// An issued session: bearer token plus the identity it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: Identity,
}

//! Public-facing profile, one-to-one with an identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read projection of a `profiles` row.
///
/// `green_name` is assigned at signup by the backend and read-only here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileView {
    #[serde(default)]
    pub green_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Upsert payload for the bio, keyed by identity id.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpsert {
    pub user_id: Uuid,
    pub bio: Option<String>,
}

//! Communities and their membership roster.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// A row of the `communities` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Roles recorded on `community_members` rows.
pub mod community_roles {
    pub const OWNER: &str = "owner";
    pub const MEMBER: &str = "member";
}

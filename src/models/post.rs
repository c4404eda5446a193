//! Posts and the feed projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Insert payload for the `posts` collection.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub user_id: Uuid,
    pub caption: Option<String>,
    pub image_url: Option<String>,
}

/// Embedded author reference on a feed row.
#[derive(Debug, Clone, Deserialize)]
pub struct PostAuthor {
    #[serde(default)]
    pub green_name: Option<String>,
}

/// A feed row: post columns joined with the author's green name.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPost {
    pub id: Uuid,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: Option<PostAuthor>,
}

impl FeedPost {
    /// Display name for the feed; "Anonymous" when no profile row joined.
    pub fn author_name(&self) -> &str {
        self.profiles
            .as_ref()
            .and_then(|p| p.green_name.as_deref())
            .unwrap_or("Anonymous")
    }
}

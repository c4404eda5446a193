//! Profile view: green name, bio, and post count.

use std::sync::Arc;

use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::{ProfileUpsert, ProfileView};
use crate::session::SessionResolver;

/// Everything the profile view renders.
#[derive(Debug, Clone, Default)]
pub struct ProfileOverview {
    pub green_name: String,
    pub bio: String,
    pub posts_count: u64,
}

pub struct ProfileFlow {
    client: Arc<RemoteClient>,
    session: Arc<SessionResolver>,
}

impl ProfileFlow {
    pub fn new(client: Arc<RemoteClient>, session: Arc<SessionResolver>) -> Self {
        Self { client, session }
    }

    pub async fn load(&self) -> Result<ProfileOverview, AppError> {
        let identity = self
            .session
            .snapshot()
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))?;

        let profile = self
            .client
            .table("profiles")
            .select("green_name, bio")
            .eq("user_id", identity.id)
            .fetch_optional::<ProfileView>()
            .await?
            .unwrap_or_default();

        let posts_count = self
            .client
            .table("posts")
            .select("id")
            .eq("user_id", identity.id)
            .count()
            .await?;

        Ok(ProfileOverview {
            green_name: profile.green_name.unwrap_or_default(),
            bio: profile.bio.unwrap_or_default(),
            posts_count,
        })
    }

    /// Upsert the bio, keyed by identity id. Empty input is stored as null.
    pub async fn save_bio(&self, bio: &str) -> Result<(), AppError> {
        let identity = self
            .session
            .snapshot()
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))?;

        let bio = bio.trim();
        let row = ProfileUpsert {
            user_id: identity.id,
            bio: if bio.is_empty() {
                None
            } else {
                Some(bio.to_string())
            },
        };

        self.client.table("profiles").upsert(&row).await
    }
}

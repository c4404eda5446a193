//! Settings view: notification preferences and feedback.

use std::sync::Arc;

use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::{NewFeedback, UserSettings};
use crate::session::SessionResolver;

pub struct SettingsFlow {
    client: Arc<RemoteClient>,
    session: Arc<SessionResolver>,
}

impl SettingsFlow {
    pub fn new(client: Arc<RemoteClient>, session: Arc<SessionResolver>) -> Self {
        Self { client, session }
    }

    /// Current notification preferences, defaulted when no row exists yet.
    pub async fn load(&self) -> Result<UserSettings, AppError> {
        let identity = self
            .session
            .snapshot()
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))?;

        let settings = self
            .client
            .table("user_settings")
            .select("user_id, email_notifications, push_notifications")
            .eq("user_id", identity.id)
            .fetch_optional::<UserSettings>()
            .await?;

        Ok(settings.unwrap_or(UserSettings {
            user_id: identity.id,
            email_notifications: true,
            push_notifications: false,
        }))
    }

    /// Whole-row upsert of both flags. No partial update; a failed write
    /// is only reported, never rolled back locally.
    pub async fn save(&self, email: bool, push: bool) -> Result<(), AppError> {
        let identity = self
            .session
            .snapshot()
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))?;

        let row = UserSettings {
            user_id: identity.id,
            email_notifications: email,
            push_notifications: push,
        };

        self.client.table("user_settings").upsert(&row).await
    }

    /// Append a feedback record, anonymously when signed out. The text is
    /// stored as entered; trimming applies only to the blank check.
    pub async fn submit_feedback(&self, content: &str) -> Result<(), AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Please enter your feedback.".to_string(),
            ));
        }

        let row = NewFeedback {
            user_id: self.session.snapshot().identity.map(|i| i.id),
            content: content.to_string(),
        };

        self.client.table("feedback").insert(&row).await
    }
}

//! Per-user settings and feedback records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `user_settings` collection. Upserted wholesale on save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub email_notifications: bool,
    pub push_notifications: bool,
}

/// Insert payload for the append-only `feedback` collection.
///
/// `user_id` is null for anonymous submissions.
#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback {
    pub user_id: Option<Uuid>,
    pub content: String,
}

//! Challenges and participation rows.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// A row of the `challenges` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Participation status. Transitions only joined -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    Joined,
    Completed,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Joined => "joined",
            ParticipationStatus::Completed => "completed",
        }
    }
}

/// A participation row joined with its challenge, as listed under
/// "my challenges".
#[derive(Debug, Clone, Deserialize)]
pub struct MyChallenge {
    pub status: ParticipationStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub challenges: Option<Challenge>,
}

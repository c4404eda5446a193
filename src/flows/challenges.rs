//! Challenges view: create, search by title, join, list mine, complete.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::workflow::{EmptyQueryPolicy, EntityWorkflow, WorkflowSpec};
use super::OpSlot;
use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::{Challenge, MyChallenge, ParticipationStatus};
use crate::session::SessionResolver;

/// Unlike communities, an empty challenge search browses everything
/// (bounded by the result cap).
const CHALLENGE_WORKFLOW: WorkflowSpec = WorkflowSpec {
    entity_table: "challenges",
    membership_table: "challenge_participants",
    name_column: "title",
    entity_fk: "challenge_id",
    role_column: "status",
    creator_role: "joined",
    joiner_role: "joined",
    search_columns: "id, title, description, created_at",
    empty_query: EmptyQueryPolicy::MatchAll,
    noun: "challenge",
};

pub struct ChallengeFlow {
    workflow: EntityWorkflow,
    completing: OpSlot,
}

impl ChallengeFlow {
    pub fn new(client: Arc<RemoteClient>, session: Arc<SessionResolver>) -> Self {
        Self {
            workflow: EntityWorkflow::new(client, session, CHALLENGE_WORKFLOW),
            completing: OpSlot::new(),
        }
    }

    /// Create a challenge; the creator is recorded as a joined participant.
    pub async fn create(&self, title: &str, description: &str) -> Result<Uuid, AppError> {
        self.workflow.create(title, description).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Challenge>, AppError> {
        self.workflow.search(query).await
    }

    pub async fn join(&self, challenge_id: Uuid) -> Result<(), AppError> {
        self.workflow.join(challenge_id).await
    }

    /// Participation rows for the current identity, joined with the
    /// challenge they belong to, newest-first.
    pub async fn list_mine(&self) -> Result<Vec<MyChallenge>, AppError> {
        let identity = self.workflow.require_identity()?;

        self.workflow
            .client()
            .table("challenge_participants")
            .select("status, completed_at, challenges:challenge_id(id, title, description, created_at)")
            .eq("user_id", identity.id)
            .order_desc("created_at")
            .fetch()
            .await
    }

    /// Mark a participation completed and stamp the completion time.
    ///
    /// Re-invoking re-stamps the timestamp; the status stays completed.
    pub async fn complete(&self, challenge_id: Uuid) -> Result<(), AppError> {
        let identity = self.workflow.require_identity()?;

        let _guard = self
            .completing
            .begin(challenge_id, "This challenge is already being completed.")?;

        let patch = json!({
            "status": ParticipationStatus::Completed.as_str(),
            "completed_at": Utc::now(),
        });

        self.workflow
            .client()
            .table("challenge_participants")
            .eq("challenge_id", challenge_id)
            .eq("user_id", identity.id)
            .update(&patch)
            .await
    }
}

//! Community view: create, search by name, join.
//!
//! There is no "my communities" listing; only challenges have one.

use std::sync::Arc;

use uuid::Uuid;

use super::workflow::{EmptyQueryPolicy, EntityWorkflow, WorkflowSpec};
use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::{community_roles, Community};
use crate::session::SessionResolver;

/// Observed product behavior: an empty community search shows nothing
/// rather than everything.
const COMMUNITY_WORKFLOW: WorkflowSpec = WorkflowSpec {
    entity_table: "communities",
    membership_table: "community_members",
    name_column: "name",
    entity_fk: "community_id",
    role_column: "role",
    creator_role: community_roles::OWNER,
    joiner_role: community_roles::MEMBER,
    search_columns: "id, name, description, created_at",
    empty_query: EmptyQueryPolicy::ReturnEmpty,
    noun: "community",
};

pub struct CommunityFlow {
    workflow: EntityWorkflow,
}

impl CommunityFlow {
    pub fn new(client: Arc<RemoteClient>, session: Arc<SessionResolver>) -> Self {
        Self {
            workflow: EntityWorkflow::new(client, session, COMMUNITY_WORKFLOW),
        }
    }

    /// Create a community; the creator becomes its owner.
    pub async fn create(&self, name: &str, description: &str) -> Result<Uuid, AppError> {
        self.workflow.create(name, description).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Community>, AppError> {
        self.workflow.search(query).await
    }

    pub async fn join(&self, community_id: Uuid) -> Result<(), AppError> {
        self.workflow.join(community_id).await
    }
}

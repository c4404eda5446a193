//! The create/search/join workflow shared by communities and challenges.
//!
//! Both entity kinds have the same shape: a named, user-creatable object
//! with a membership roster. Creating one inserts the entity row and then
//! the creator's membership row; the two inserts are sequential, not
//! atomic, and a second-step failure leaves the entity row in place.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::OpSlot;
use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::Identity;
use crate::session::SessionResolver;

/// Result cap for entity search.
pub const SEARCH_LIMIT: usize = 20;

/// What a search with an empty (whitespace-only) query does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyQueryPolicy {
    /// Short-circuit to an empty result set without a remote call.
    ReturnEmpty,
    /// Run the search with an empty pattern: everything matches, bounded
    /// by the result cap.
    MatchAll,
}

/// Table layout of one workflow instantiation.
pub struct WorkflowSpec {
    pub entity_table: &'static str,
    pub membership_table: &'static str,
    /// The searchable name/title column.
    pub name_column: &'static str,
    /// Foreign-key column on the membership table.
    pub entity_fk: &'static str,
    /// Role-or-status column on the membership table.
    pub role_column: &'static str,
    /// Marker written with the creator's membership row.
    pub creator_role: &'static str,
    /// Marker written on a plain join.
    pub joiner_role: &'static str,
    /// Columns returned by search.
    pub search_columns: &'static str,
    pub empty_query: EmptyQueryPolicy,
    /// Lowercase noun for user-facing messages.
    pub noun: &'static str,
}

#[derive(Debug, serde::Deserialize)]
struct InsertedId {
    id: Uuid,
}

/// One instantiated workflow over the shared client and session.
pub struct EntityWorkflow {
    client: Arc<RemoteClient>,
    session: Arc<SessionResolver>,
    spec: WorkflowSpec,
    creating: OpSlot,
    joining: OpSlot,
}

impl EntityWorkflow {
    pub fn new(
        client: Arc<RemoteClient>,
        session: Arc<SessionResolver>,
        spec: WorkflowSpec,
    ) -> Self {
        Self {
            client,
            session,
            spec,
            creating: OpSlot::new(),
            joining: OpSlot::new(),
        }
    }

    pub(crate) fn client(&self) -> &Arc<RemoteClient> {
        &self.client
    }

    pub(crate) fn require_identity(&self) -> Result<Identity, AppError> {
        self.session
            .snapshot()
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))
    }

    /// Create an entity owned by the current identity, then record the
    /// creator's membership. A membership failure is surfaced as the whole
    /// operation's failure; the entity row is not rolled back.
    pub async fn create(&self, name: &str, description: &str) -> Result<Uuid, AppError> {
        let identity = self.require_identity()?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(format!(
                "Enter a {} {}.",
                self.spec.noun,
                if self.spec.name_column == "title" {
                    "title"
                } else {
                    "name"
                }
            )));
        }

        let _guard = self.creating.begin(
            Uuid::nil(),
            &format!("A {} is already being created.", self.spec.noun),
        )?;

        let mut row = Map::new();
        row.insert(self.spec.name_column.to_string(), json!(name));
        row.insert("description".to_string(), json!(description.trim()));
        row.insert("created_by".to_string(), json!(identity.id));

        let inserted: InsertedId = self
            .client
            .table(self.spec.entity_table)
            .select("id")
            .insert_returning(&Value::Object(row))
            .await?;

        self.insert_membership(inserted.id, identity.id, self.spec.creator_role)
            .await?;

        tracing::info!(id = %inserted.id, "{} created", self.spec.noun);
        Ok(inserted.id)
    }

    /// Case-insensitive substring search on the name/title column,
    /// newest-first, capped at [`SEARCH_LIMIT`].
    pub async fn search<E: DeserializeOwned>(&self, query: &str) -> Result<Vec<E>, AppError> {
        let query = query.trim();
        if query.is_empty() && self.spec.empty_query == EmptyQueryPolicy::ReturnEmpty {
            return Ok(Vec::new());
        }

        self.client
            .table(self.spec.entity_table)
            .select(self.spec.search_columns)
            .ilike(self.spec.name_column, query)
            .order_desc("created_at")
            .limit(SEARCH_LIMIT)
            .fetch()
            .await
    }

    /// Join an existing entity. No duplicate guard here; a backend
    /// uniqueness rejection surfaces as a remote failure.
    pub async fn join(&self, entity_id: Uuid) -> Result<(), AppError> {
        let identity = self.require_identity()?;

        let _guard = self.joining.begin(
            entity_id,
            &format!("This {} is already being joined.", self.spec.noun),
        )?;

        self.insert_membership(entity_id, identity.id, self.spec.joiner_role)
            .await
    }

    async fn insert_membership(
        &self,
        entity_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> Result<(), AppError> {
        let mut row = Map::new();
        row.insert(self.spec.entity_fk.to_string(), json!(entity_id));
        row.insert("user_id".to_string(), json!(user_id));
        row.insert(self.spec.role_column.to_string(), json!(role));

        self.client
            .table(self.spec.membership_table)
            .insert(&Value::Object(row))
            .await
    }
}

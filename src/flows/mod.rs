//! Application flows: one module per authenticated view.
//!
//! Each flow is a thin remote-call sequence over the shared client plus the
//! resolved session. Operations run to completion independently; busy
//! markers guard against re-triggering an operation on a row it is already
//! pending for and always clear, success or failure.

mod account;
mod challenges;
mod community;
mod feed;
mod profile;
mod settings;
mod workflow;

pub use account::AccountFlow;
pub use challenges::ChallengeFlow;
pub use community::CommunityFlow;
pub use feed::{FeedFlow, PostImage};
pub use profile::{ProfileFlow, ProfileOverview};
pub use settings::SettingsFlow;

use std::collections::HashSet;
use std::sync::Mutex;

use uuid::Uuid;

use crate::errors::AppError;

/// In-progress markers for one operation kind, keyed by target row.
///
/// Holds the ids of the rows with a pending operation (nil for creates, so
/// at most one create runs at a time). Beginning on a row that is already
/// pending is rejected locally; different rows proceed concurrently.
pub struct OpSlot(Mutex<HashSet<Uuid>>);

impl OpSlot {
    pub fn new() -> Self {
        Self(Mutex::new(HashSet::new()))
    }

    /// Mark an operation on `id` as pending. The returned guard clears the
    /// marker on drop, so the row frees up on every exit path.
    pub fn begin(&self, id: Uuid, busy_message: &str) -> Result<OpGuard<'_>, AppError> {
        let mut pending = self.0.lock().expect("op slot poisoned");
        if !pending.insert(id) {
            return Err(AppError::Busy(busy_message.to_string()));
        }
        Ok(OpGuard { slot: self, id })
    }
}

impl Default for OpSlot {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OpGuard<'a> {
    slot: &'a OpSlot,
    id: Uuid,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.slot
            .0
            .lock()
            .expect("op slot poisoned")
            .remove(&self.id);
    }
}

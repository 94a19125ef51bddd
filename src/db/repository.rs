use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Cancelled;
use crate::models::Contact;
use crate::services::query::{QueryPage, QueryPlan};

/// Bail out with [`Cancelled`] if the token has fired.
pub fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(())
}

/// Storage for contacts, used as a unit of work.
///
/// `add_range`, `update` and `remove` only stage changes; nothing is durable
/// until `save_changes` commits every staged change atomically.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<Contact>>;

    /// Every stored contact, unfiltered and in no particular order.
    async fn query_all(&self, cancel: &CancellationToken) -> Result<Vec<Contact>>;

    async fn add_range(&self, contacts: Vec<Contact>, cancel: &CancellationToken) -> Result<()>;

    fn update(&self, contact: Contact);

    fn remove(&self, contact: Contact);

    /// Drop staged changes without applying them.
    fn discard_changes(&self);

    /// Commit staged changes; returns the number of affected records.
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize>;

    /// Run a list plan. Stores that can push the plan down override this.
    async fn query(&self, plan: &QueryPlan, cancel: &CancellationToken) -> Result<QueryPage> {
        let contacts = self.query_all(cancel).await?;
        Ok(plan.evaluate(contacts))
    }
}

/// A staged change waiting for `save_changes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Insert(Contact),
    Update(Contact),
    Delete(Uuid),
}

/// Staging area shared by the repository implementations.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    pending: Mutex<Vec<PendingChange>>,
}

impl ChangeSet {
    pub(crate) fn push(&self, change: PendingChange) {
        self.lock().push(change);
    }

    pub(crate) fn extend(&self, changes: impl IntoIterator<Item = PendingChange>) {
        self.lock().extend(changes);
    }

    pub(crate) fn take(&self) -> Vec<PendingChange> {
        std::mem::take(&mut *self.lock())
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PendingChange>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::repository::{ensure_active, ChangeSet, ContactRepository, PendingChange};
use crate::models::Contact;

/// In-process [`ContactRepository`] with the same unit-of-work semantics as the SQLite one.
#[derive(Debug, Default)]
pub struct MemoryContactRepository {
    contacts: RwLock<HashMap<Uuid, Contact>>,
    changes: ChangeSet,
}

impl MemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with committed contacts.
    pub fn with_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.contacts.write().unwrap_or_else(PoisonError::into_inner);
            for contact in contacts {
                map.insert(contact.id, contact);
            }
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.contacts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContactRepository for MemoryContactRepository {
    async fn get_by_id(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<Contact>> {
        ensure_active(cancel)?;
        let map = self.contacts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(&id).cloned())
    }

    async fn query_all(&self, cancel: &CancellationToken) -> Result<Vec<Contact>> {
        ensure_active(cancel)?;
        let map = self.contacts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.values().cloned().collect())
    }

    async fn add_range(&self, contacts: Vec<Contact>, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        self.changes
            .extend(contacts.into_iter().map(PendingChange::Insert));
        Ok(())
    }

    fn update(&self, contact: Contact) {
        self.changes.push(PendingChange::Update(contact));
    }

    fn remove(&self, contact: Contact) {
        self.changes.push(PendingChange::Delete(contact.id));
    }

    fn discard_changes(&self) {
        self.changes.clear();
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_active(cancel)?;
        let changes = self.changes.take();

        let mut map = self.contacts.write().unwrap_or_else(PoisonError::into_inner);
        // Work on a copy so a failing change leaves the store untouched
        let mut next = map.clone();
        for change in &changes {
            match change {
                PendingChange::Insert(contact) => {
                    if next.insert(contact.id, contact.clone()).is_some() {
                        bail!("contact {} already exists", contact.id);
                    }
                }
                PendingChange::Update(contact) => match next.get_mut(&contact.id) {
                    Some(stored) => *stored = contact.clone(),
                    None => bail!("contact {} no longer exists", contact.id),
                },
                PendingChange::Delete(id) => {
                    if next.remove(id).is_none() {
                        bail!("contact {} no longer exists", id);
                    }
                }
            }
        }
        *map = next;
        Ok(changes.len())
    }
}

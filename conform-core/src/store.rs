//! Application store trait and the in-memory implementation.

use crate::application::{ApplicationRecord, Interaction};
use crate::error::ConformError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use uuid::Uuid;

/// Persistence for application records.
///
/// All operations are keyed by the application id. Absence is reported as
/// `None`/`false`, never as an empty value; `Err` is reserved for failures
/// of the store itself.
#[async_trait]
pub trait ApplicationStore: Send + Sync + Debug + 'static {
    /// Insert a record under `id`, returning the id.
    ///
    /// Ids are never reused; inserting over an existing record is a store
    /// error.
    async fn create_application(
        &self,
        id: Uuid,
        record: ApplicationRecord,
    ) -> Result<Uuid, ConformError>;

    /// Fetch a snapshot of a record
    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, ConformError>;

    /// Remove a record; `false` if it did not exist
    async fn delete_application(&self, id: Uuid) -> Result<bool, ConformError>;

    /// Append to a record's interaction log; `false` if it did not exist
    async fn append_interaction(
        &self,
        id: Uuid,
        entry: Interaction,
    ) -> Result<bool, ConformError>;

    /// The full interaction log of a record
    async fn get_interactions(&self, id: Uuid) -> Result<Option<Vec<Interaction>>, ConformError>;
}

/// Process-local store.
///
/// Each instance owns its own map, so separate stores never share records.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    applications: DashMap<Uuid, ApplicationRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored applications
    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryStore {
    async fn create_application(
        &self,
        id: Uuid,
        mut record: ApplicationRecord,
    ) -> Result<Uuid, ConformError> {
        record.id = id;
        match self.applications.entry(id) {
            Entry::Occupied(_) => Err(ConformError::store(format!(
                "application {} already exists",
                id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(id)
            }
        }
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, ConformError> {
        Ok(self.applications.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete_application(&self, id: Uuid) -> Result<bool, ConformError> {
        Ok(self.applications.remove(&id).is_some())
    }

    async fn append_interaction(
        &self,
        id: Uuid,
        entry: Interaction,
    ) -> Result<bool, ConformError> {
        match self.applications.get_mut(&id) {
            Some(mut record) => {
                record.interactions.push(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_interactions(&self, id: Uuid) -> Result<Option<Vec<Interaction>>, ConformError> {
        Ok(self
            .applications
            .get(&id)
            .map(|entry| entry.interactions.clone()))
    }
}

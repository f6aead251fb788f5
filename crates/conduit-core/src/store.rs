//! Connector-instance store collaborator.
//!
//! The CRUD subsystem owns instances; the dispatcher and the metrics
//! aggregator only read them, always scoped to one organization.

use crate::model::ConnectorInstance;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by instance store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or failed the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Read-only access to connector instances.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Look up an instance by id, filtered by owning organization.
    async fn get(
        &self,
        instance_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<ConnectorInstance>, StoreError>;

    /// All instances of an organization.
    async fn list(&self, organization_id: Uuid) -> Result<Vec<ConnectorInstance>, StoreError>;

    async fn list_ids(&self, organization_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .list(organization_id)
            .await?
            .into_iter()
            .map(|instance| instance.id)
            .collect())
    }

    async fn active_count(&self, organization_id: Uuid) -> Result<usize, StoreError> {
        Ok(self
            .list(organization_id)
            .await?
            .iter()
            .filter(|instance| instance.is_active)
            .count())
    }
}

/// Instance store held in memory. Used by tests and the `memory` backend.
#[derive(Default)]
pub struct InMemoryInstanceStore {
    instances: RwLock<HashMap<Uuid, ConnectorInstance>>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an instance.
    pub fn insert(&self, instance: ConnectorInstance) -> Result<(), StoreError> {
        let mut instances = self.instances.write().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        instances.insert(instance.id, instance);
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn get(
        &self,
        instance_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<ConnectorInstance>, StoreError> {
        let instances = self.instances.read().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(instances
            .get(&instance_id)
            .filter(|instance| instance.organization_id == organization_id)
            .cloned())
    }

    async fn list(&self, organization_id: Uuid) -> Result<Vec<ConnectorInstance>, StoreError> {
        let instances = self.instances.read().map_err(|e| {
            StoreError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut owned: Vec<_> = instances
            .values()
            .filter(|instance| instance.organization_id == organization_id)
            .cloned()
            .collect();
        owned.sort_by_key(|instance| instance.created_at);
        Ok(owned)
    }
}

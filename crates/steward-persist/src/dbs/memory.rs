use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{next_handle, Datanode, ThreadRecord};
use crate::repositories::{NodeRepository, ThreadRepository};

/// Process-local thread storage, used in tests and single-node deployments
#[derive(Default)]
pub struct InMemoryThreadRepository {
    tenants: RwLock<HashMap<String, BTreeMap<String, ThreadRecord>>>,
}

impl InMemoryThreadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record with a caller-chosen handle
    pub async fn insert(&self, tenant: &str, record: ThreadRecord) {
        self.tenants
            .write()
            .await
            .entry(tenant.to_string())
            .or_default()
            .insert(record.handle.clone(), record);
    }
}

#[async_trait]
impl ThreadRepository for InMemoryThreadRepository {
    async fn get_thread(&self, tenant: &str, handle: &str) -> Result<Option<ThreadRecord>> {
        let tenants = self.tenants.read().await;
        Ok(tenants.get(tenant).and_then(|t| t.get(handle)).cloned())
    }

    async fn create_thread(&self, tenant: &str, provider_thread_id: &str) -> Result<ThreadRecord> {
        // The write guard is the allocation critical section
        let mut tenants = self.tenants.write().await;
        let records = tenants.entry(tenant.to_string()).or_default();

        let handle = next_handle(records.keys().map(String::as_str))?;
        let record = ThreadRecord::new(handle.clone(), provider_thread_id);
        records.insert(handle, record.clone());
        Ok(record)
    }

    async fn rename_thread(&self, tenant: &str, handle: &str, display_name: &str) -> Result<bool> {
        let mut tenants = self.tenants.write().await;
        match tenants.get_mut(tenant).and_then(|t| t.get_mut(handle)) {
            Some(record) => {
                record.display_name = display_name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_threads(&self, tenant: &str) -> Result<BTreeMap<String, ThreadRecord>> {
        let tenants = self.tenants.read().await;
        Ok(tenants.get(tenant).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryNodeRepository {
    trees: RwLock<HashMap<String, Datanode>>,
}

impl InMemoryNodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(tenant: &str, tree: Datanode) -> Self {
        let mut trees = HashMap::new();
        trees.insert(tenant.to_string(), tree);
        Self {
            trees: RwLock::new(trees),
        }
    }
}

#[async_trait]
impl NodeRepository for InMemoryNodeRepository {
    async fn load_tree(&self, tenant: &str) -> Result<Datanode> {
        self.trees
            .read()
            .await
            .get(tenant)
            .cloned()
            .ok_or_else(|| PersistError::TreeNotFound(tenant.to_string()))
    }

    async fn save_tree(&self, tenant: &str, tree: &Datanode) -> Result<()> {
        self.trees
            .write()
            .await
            .insert(tenant.to_string(), tree.clone());
        Ok(())
    }
}

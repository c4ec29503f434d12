use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{PersistError, Result};
use crate::models::{Datanode, NodePayload};
use crate::prune::{prune_tree, RelevanceJudge};
use crate::repositories::NodeRepository;

/// Tree operations over a [`NodeRepository`].
///
/// Every mutation is a load-modify-save under one writer lock, so two
/// exchanges editing the same tree never lose each other's updates.
pub struct NodeStore {
    repository: Arc<dyn NodeRepository>,
    judge: Option<Arc<dyn RelevanceJudge>>,
    write_lock: Mutex<()>,
}

impl NodeStore {
    pub fn new(repository: Arc<dyn NodeRepository>) -> Self {
        Self {
            repository,
            judge: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_judge(mut self, judge: Arc<dyn RelevanceJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub async fn load_tree(&self, tenant: &str) -> Result<Datanode> {
        self.repository.load_tree(tenant).await
    }

    /// Replace the whole tree. Node ids must be unique across it.
    pub async fn save_tree(&self, tenant: &str, tree: &Datanode) -> Result<()> {
        if let Some(duplicate) = tree.duplicate_node_id() {
            return Err(PersistError::InvalidNode(format!(
                "duplicate node_id: {}",
                duplicate
            )));
        }
        let _guard = self.write_lock.lock().await;
        self.repository.save_tree(tenant, tree).await
    }

    /// Load the tenant's tree, creating an empty root when there is none
    pub async fn load_or_init(&self, tenant: &str) -> Result<Datanode> {
        let _guard = self.write_lock.lock().await;
        match self.repository.load_tree(tenant).await {
            Ok(tree) => Ok(tree),
            Err(PersistError::TreeNotFound(_)) => {
                let root = Datanode::new_root();
                self.repository.save_tree(tenant, &root).await?;
                tracing::info!(tenant, "initialised empty node tree");
                Ok(root)
            }
            Err(e) => Err(e),
        }
    }

    /// Serialized read-modify-write. Nothing is saved when `apply` fails.
    pub async fn update<T, F>(&self, tenant: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Datanode) -> Result<T> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut tree = self.repository.load_tree(tenant).await?;
        let out = apply(&mut tree)?;
        self.repository.save_tree(tenant, &tree).await?;
        Ok(out)
    }

    pub async fn find_node(&self, tenant: &str, node_id: &str) -> Result<Datanode> {
        let tree = self.load_tree(tenant).await?;
        tree.find(node_id)
            .cloned()
            .ok_or_else(|| PersistError::NodeNotFound(node_id.to_string()))
    }

    pub async fn insert_child(
        &self,
        tenant: &str,
        parent_id: &str,
        payload: NodePayload,
        node_type: Option<String>,
    ) -> Result<String> {
        let node_id = self
            .update(tenant, |tree| tree.insert_child(parent_id, payload, node_type))
            .await?;
        tracing::info!(tenant, parent_id, node_id = %node_id, "inserted datanode");
        Ok(node_id)
    }

    pub async fn replace_contents(
        &self,
        tenant: &str,
        node_id: &str,
        payload: NodePayload,
    ) -> Result<()> {
        self.update(tenant, |tree| tree.replace_contents(node_id, payload))
            .await?;
        tracing::info!(tenant, node_id, "replaced datanode contents");
        Ok(())
    }

    /// Merge fields into a node and return the updated node
    pub async fn update_node(
        &self,
        tenant: &str,
        node_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Datanode> {
        self.update(tenant, |tree| {
            tree.update_node(node_id, fields)?;
            tree.find(node_id)
                .cloned()
                .ok_or_else(|| PersistError::NodeNotFound(node_id.to_string()))
        })
        .await
    }

    pub async fn remove_node(&self, tenant: &str, node_id: &str) -> Result<Datanode> {
        let removed = self
            .update(tenant, |tree| tree.remove_node(node_id))
            .await?;
        tracing::info!(tenant, node_id, "removed datanode");
        Ok(removed)
    }

    pub async fn prune(&self, tenant: &str, prompt: &str) -> Result<Datanode> {
        let judge = self
            .judge
            .as_ref()
            .ok_or_else(|| PersistError::Internal("no relevance judge configured".to_string()))?;
        let tree = self.load_tree(tenant).await?;
        prune_tree(&tree, prompt, judge.as_ref()).await
    }
}

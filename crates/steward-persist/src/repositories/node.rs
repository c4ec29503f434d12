use async_trait::async_trait;

use crate::error::Result;
use crate::models::Datanode;

/// Whole-tree storage, one tree per tenant
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Fails with `TreeNotFound` when the tenant has no tree yet
    async fn load_tree(&self, tenant: &str) -> Result<Datanode>;

    /// Atomic replace of the tenant's tree
    async fn save_tree(&self, tenant: &str, tree: &Datanode) -> Result<()>;
}

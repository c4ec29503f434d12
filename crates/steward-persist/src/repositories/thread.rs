use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ThreadRecord;

/// Durable handle -> thread record mapping, scoped per tenant
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn get_thread(&self, tenant: &str, handle: &str) -> Result<Option<ThreadRecord>>;

    /// Persist a record under a freshly allocated handle.
    ///
    /// Allocation is a serialized read-modify-write: two concurrent calls
    /// never receive the same handle.
    async fn create_thread(&self, tenant: &str, provider_thread_id: &str) -> Result<ThreadRecord>;

    /// Returns `false` when the handle is unknown
    async fn rename_thread(&self, tenant: &str, handle: &str, display_name: &str) -> Result<bool>;

    async fn list_threads(&self, tenant: &str) -> Result<BTreeMap<String, ThreadRecord>>;
}

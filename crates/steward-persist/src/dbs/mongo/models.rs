use serde::{Deserialize, Serialize};

use crate::models::{Datanode, ThreadRecord};

/// One thread record per document, keyed by (tenant, handle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    pub tenant: String,
    pub handle: String,
    pub provider_thread_id: String,
    pub display_name: String,
}

impl MongoThread {
    pub fn new(tenant: &str, record: &ThreadRecord) -> Self {
        Self {
            tenant: tenant.to_string(),
            handle: record.handle.clone(),
            provider_thread_id: record.provider_thread_id.clone(),
            display_name: record.display_name.clone(),
        }
    }
}

impl From<MongoThread> for ThreadRecord {
    fn from(doc: MongoThread) -> Self {
        ThreadRecord {
            handle: doc.handle,
            provider_thread_id: doc.provider_thread_id,
            display_name: doc.display_name,
        }
    }
}

/// A tenant's whole tree stored as a single document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFamily {
    #[serde(rename = "_id")]
    pub tenant: String,
    pub nodes: Datanode,
}
